//! Closed path → validated, immutable `Territory`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::types::{CaptureSession, ClosedSession};
use crate::config::GameConfig;
use crate::geo::{
    self, centroid, haversine_m, polygon_area_m2, ring_perimeter_m, BoundingBox, GeoPoint,
};
use crate::poi::Poi;
use crate::sampling::Timestamp;

/// A committed territory. Geometry is fixed at creation.
///
/// Invariants (when produced by `PolygonFinalizer`):
/// - `polygon.len() >= 3`, stored open (first vertex not repeated).
/// - `min_area <= area_m2 <= max_area` and `bbox.short_side_m() >= min_span`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    id: Uuid,
    owner_id: String,
    centroid: GeoPoint,
    polygon: Vec<GeoPoint>,
    area_m2: f64,
    point_count: usize,
    bbox: BoundingBox,
    perimeter_m: f64,
    walked_m: f64,
    started_at: Timestamp,
    completed_at: Timestamp,
}

impl Territory {
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }
    #[inline]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
    /// Arithmetic mean of the ring vertices.
    #[inline]
    pub fn centroid(&self) -> GeoPoint {
        self.centroid
    }
    #[inline]
    pub fn polygon(&self) -> &[GeoPoint] {
        &self.polygon
    }
    #[inline]
    pub fn area_m2(&self) -> f64 {
        self.area_m2
    }
    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count
    }
    #[inline]
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
    /// Length of the closed ring.
    #[inline]
    pub fn perimeter_m(&self) -> f64 {
        self.perimeter_m
    }
    /// Distance actually walked between accepted samples.
    #[inline]
    pub fn walked_m(&self) -> f64 {
        self.walked_m
    }
    #[inline]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }
    #[inline]
    pub fn completed_at(&self) -> Timestamp {
        self.completed_at
    }

    /// Point-in-polygon test, with a bounding-box early out.
    ///
    /// Gate for building placement.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.bbox.contains(point) && geo::contains(point, &self.polygon)
    }

    /// POIs located inside this territory.
    pub fn pois_within<'a>(&self, pois: &'a [Poi]) -> Vec<&'a Poi> {
        pois.iter().filter(|p| self.contains(p.location)).collect()
    }
}

/// The geometry rule a closed loop violated.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("ring has {count} points, need at least {required}")]
    TooFewPoints { count: usize, required: usize },
    #[error("bounding box short side {span_m:.1} m is below {min_m:.1} m")]
    SpanTooThin { span_m: f64, min_m: f64 },
    #[error("area {area_m2:.1} m² is below {min_m2:.1} m²")]
    AreaTooSmall { area_m2: f64, min_m2: f64 },
    #[error("area {area_m2:.1} m² exceeds {max_m2:.1} m²")]
    AreaTooLarge { area_m2: f64, max_m2: f64 },
    /// A stored territory whose recorded measures disagree with its ring.
    #[error("stored {field} does not match the polygon")]
    Mismatch { field: &'static str },
}

/// Validation failure that hands the session back for continued walking.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct Rejected {
    pub reason: ValidationError,
    pub session: CaptureSession,
}

/// Measures of a ring that passed every rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub area_m2: f64,
    pub span_m: f64,
    pub bbox: BoundingBox,
    pub centroid: GeoPoint,
}

/// Builds and validates the polygon of a closed loop.
#[derive(Clone, Copy, Debug)]
pub struct PolygonFinalizer {
    min_points: usize,
    min_span_m: f64,
    min_area_m2: f64,
    max_area_m2: f64,
}

impl PolygonFinalizer {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            min_points: cfg.sampling_min_points.max(3),
            min_span_m: cfg.territory_min_span_m,
            min_area_m2: cfg.territory_min_area_m2,
            max_area_m2: cfg.territory_max_area_m2,
        }
    }

    /// Check point count, span and area bounds, in that order.
    pub fn measure(&self, ring: &[GeoPoint]) -> Result<Measurement, ValidationError> {
        let too_few = ValidationError::TooFewPoints {
            count: ring.len(),
            required: self.min_points,
        };
        if ring.len() < self.min_points {
            return Err(too_few);
        }
        let (Some(bbox), Some(centroid)) = (BoundingBox::from_points(ring), centroid(ring)) else {
            return Err(too_few);
        };

        let area_m2 = polygon_area_m2(ring);
        let span_m = bbox.short_side_m();
        if span_m < self.min_span_m {
            return Err(ValidationError::SpanTooThin {
                span_m,
                min_m: self.min_span_m,
            });
        }
        if area_m2 < self.min_area_m2 {
            return Err(ValidationError::AreaTooSmall {
                area_m2,
                min_m2: self.min_area_m2,
            });
        }
        if area_m2 > self.max_area_m2 {
            return Err(ValidationError::AreaTooLarge {
                area_m2,
                max_m2: self.max_area_m2,
            });
        }
        Ok(Measurement {
            area_m2,
            span_m,
            bbox,
            centroid,
        })
    }

    /// Consume a closed session into a territory, or return it with the reason.
    pub fn finalize(
        &self,
        closed: ClosedSession,
        owner_id: &str,
        completed_at: Timestamp,
    ) -> Result<Territory, Rejected> {
        let ring = closed.session().path().vertices();
        let m = match self.measure(&ring) {
            Ok(m) => m,
            Err(reason) => {
                return Err(Rejected {
                    reason,
                    session: closed.reopen(),
                })
            }
        };
        let session = closed.session();
        Ok(Territory {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            centroid: m.centroid,
            perimeter_m: ring_perimeter_m(&ring),
            point_count: ring.len(),
            area_m2: m.area_m2,
            bbox: m.bbox,
            walked_m: session.path().walked_m(),
            started_at: session.started_at(),
            completed_at,
            polygon: ring,
        })
    }

    /// Re-check a territory that did not come out of `finalize`, e.g. one read
    /// back from storage. The ring must pass `measure` and the recorded
    /// measures must agree with it.
    pub fn revalidate(&self, territory: &Territory) -> Result<(), ValidationError> {
        let ring = territory.polygon();
        if !ring.iter().all(GeoPoint::is_valid) {
            return Err(ValidationError::Mismatch { field: "polygon" });
        }
        let m = self.measure(ring)?;
        let close =
            |stored: f64, fresh: f64| (stored - fresh).abs() <= 1e-6 * fresh.abs().max(1.0);
        let mismatch = if territory.point_count() != ring.len() {
            Some("point_count")
        } else if !close(territory.area_m2(), m.area_m2) {
            Some("area_m2")
        } else if haversine_m(territory.centroid(), m.centroid) > 0.01 {
            Some("centroid")
        } else if !same_bbox(territory.bbox(), &m.bbox) {
            Some("bbox")
        } else {
            None
        };
        match mismatch {
            Some(field) => Err(ValidationError::Mismatch { field }),
            None => Ok(()),
        }
    }
}

fn same_bbox(a: &BoundingBox, b: &BoundingBox) -> bool {
    const EPS_DEG: f64 = 1e-9;
    [
        (a.min_lat, b.min_lat),
        (a.max_lat, b.max_lat),
        (a.min_lon, b.min_lon),
        (a.max_lon, b.max_lon),
    ]
    .iter()
    .all(|(x, y)| (x - y).abs() <= EPS_DEG)
}
