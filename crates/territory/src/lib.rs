//! Territory capture engine: GPS fixes in, validated land claims out.
//!
//! A player walks a closed loop; filtered fixes accumulate into a path, the loop
//! closes once the newest point returns near the origin, and the resulting
//! polygon is validated and committed as an immutable `Territory`. Around that
//! core sit point-in-polygon queries, POI scavenge cooldowns and encroachment
//! warnings.
//!
//! Layout
//! - `geo`: coordinates, haversine, local-plane area, point-in-polygon.
//! - `sampling`: fix screening/filtering and the accepted-point path.
//! - `capture`: loop detection, polygon finalization, the state machine.
//! - `poi`, `guard`: stateless queries over committed data.
//! - `trace`: seeded synthetic walking tracks.
//! - `config`: every tunable threshold in one `GameConfig`.
//!
//! The crate does no I/O beyond `GameConfig::from_file`; logging goes through
//! `tracing` and is silent unless the host installs a subscriber.

pub mod api;
pub mod capture;
pub mod config;
pub mod geo;
pub mod guard;
pub mod poi;
pub mod sampling;
pub mod trace;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use capture::{Territory, TerritoryCaptureEngine};
pub use config::GameConfig;
pub use geo::GeoPoint;
pub use sampling::{LocationFix, Timestamp};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::capture::{
        CaptureError, CaptureSnapshot, FixOutcome, Phase, SnapshotHandle, Territory,
        TerritoryCaptureEngine, ValidationError,
    };
    pub use crate::config::GameConfig;
    pub use crate::geo::{haversine_m, GeoPoint};
    pub use crate::poi::{Poi, PoiCooldownTracker};
    pub use crate::sampling::{LocationFix, RejectReason, Timestamp};
}
