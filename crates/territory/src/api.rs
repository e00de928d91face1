//! Curated surface for host applications.
//!
//! Prefer these re-exports over deep module paths; the module tree is free to
//! move around underneath.

// Capture pipeline
pub use crate::capture::{
    CaptureError, CaptureSnapshot, CaptureState, Closure, FixOutcome, LoopDetector, Phase,
    PolygonFinalizer, SnapshotHandle, Territory, TerritoryCaptureEngine, ValidationError,
};
pub use crate::sampling::{
    screen, LocationFix, MalformedFix, PathAccumulator, PathPoint, RejectReason, SampleFilter,
    Timestamp, Verdict,
};
// Geometry
pub use crate::geo::{
    contains as point_in_polygon, haversine_m, polygon_area_m2, BoundingBox, GeoPoint,
};
// Queries over committed data
pub use crate::guard::{Encroachment, TerritoryGuard, WarningLevel};
pub use crate::poi::{Poi, PoiCooldownTracker};
// Configuration
pub use crate::config::{ConfigError, GameConfig};
// Synthetic tracks
pub use crate::trace::{
    polygon_loop, radial_loop, square_loop, ReplayToken as TrackReplay, TrackCfg,
};
