//! Geographic math for city-scale regions.
//!
//! Purpose
//! - Keep every floating-point decision about distance, area and containment in
//!   one pure module that can be tested apart from the capture state machine.
//!
//! Conventions
//! - Distances are great-circle (haversine) metres on a sphere of radius
//!   `EARTH_RADIUS_M`.
//! - Areas are never computed in degrees. Vertices are first projected into a
//!   local tangent plane (`LocalFrame`): an equirectangular projection centered on
//!   the mean latitude of the vertices, x east and y north, in metres.
//! - Rings are open: the closing edge from the last vertex back to the first is
//!   implicit and the first vertex is not repeated.
//! - Regions must not straddle the antimeridian.
//!
//! Tolerances
//! - Geometric identities (translation, winding reversal) hold to ~1e-6 relative.
//! - GPS-driven area estimates are only meaningful to ~10%.
//!
//! Code cross-refs: `sampling::SampleFilter`, `capture::PolygonFinalizer`,
//! `guard::TerritoryGuard`.

mod pip;
mod plane;
mod types;

pub use pip::contains;
pub use plane::{
    centroid, path_length_m, polygon_area_m2, ring_perimeter_m, shoelace_signed, LocalFrame,
};
pub use types::{haversine_m, BoundingBox, GeoPoint, EARTH_RADIUS_M};
