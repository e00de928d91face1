//! Turning raw location fixes into accepted path points.
//!
//! Pipeline (per fix)
//! 1. `screen`: malformed input (non-finite or out-of-range coordinates,
//!    non-positive accuracy, timestamps running backwards) never reaches the filter.
//! 2. `SampleFilter::accept`: accuracy gate, spacing throttle, maximum step, speed
//!    gate, in that order; the first failing rule wins.
//! 3. `PathAccumulator::append`: append-only storage of accepted points.
//!
//! Every rejection is recoverable: the fix is dropped and the session continues.
//!
//! Code cross-refs: `capture::TerritoryCaptureEngine` drives this pipeline.

mod filter;
mod path;
mod types;

pub use filter::{screen, MalformedFix, RejectReason, SampleFilter, Verdict};
pub use path::PathAccumulator;
pub use types::{LocationFix, PathPoint, Timestamp};
