//! Territory capture: loop detection, polygon finalization and the state machine.
//!
//! Purpose
//! - Orchestrate one capture session end to end: filtered fixes grow the path,
//!   the newest point crossing back into range of the origin moves the session to
//!   `Closing`, and finalization either commits an immutable `Territory` or hands
//!   the session back for more walking.
//!
//! State machine
//! ```text
//! Idle      --start(_from_fix)--> Sampling
//! Sampling  --fix closes loop---> Closing
//! Closing   --finalize ok-------> Committed   (terminal)
//! Closing   --finalize err------> Sampling    (keep walking)
//! Sampling  --cancel------------> Aborted     (terminal)
//! Closing   --cancel------------> Aborted
//! ```
//! Terminal states accept a new `start`.
//!
//! Design notes
//! - The session is a payload of `CaptureState`; a finalizable session is a
//!   `ClosedSession`, which only `LoopDetector::close` can produce.
//! - Closure is edge-triggered: a session is armed once its path leaves the
//!   close radius, and a reopened session must leave and come back again.
//! - Each fix is processed synchronously. Readers on other threads see immutable
//!   snapshots through `SnapshotHandle`.
//!
//! Code cross-refs: `sampling::{screen, SampleFilter, PathAccumulator}`,
//! `geo::{polygon_area_m2, BoundingBox, contains}`.

mod detector;
mod engine;
mod finalize;
mod snapshot;
mod types;

pub use detector::{Closure, LoopDetector};
pub use engine::{CaptureError, FixOutcome, TerritoryCaptureEngine};
pub use finalize::{Measurement, PolygonFinalizer, Rejected, Territory, ValidationError};
pub use snapshot::{CaptureSnapshot, SnapshotHandle};
pub use types::{CaptureSession, CaptureState, ClosedSession, Phase};

#[cfg(test)]
mod tests;
