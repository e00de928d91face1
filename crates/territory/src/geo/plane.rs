//! Local tangent-plane projection and planar measures (shoelace area, lengths).

use nalgebra::Vector2;

use super::types::{haversine_m, GeoPoint, EARTH_RADIUS_M};

/// Equirectangular projection centered on the mean of a vertex set.
///
/// Invariants:
/// - `origin` is the arithmetic mean of the points the frame was built from.
/// - Metres per degree of longitude use `cos(origin.latitude)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalFrame {
    origin: GeoPoint,
    m_per_deg_lat: f64,
    m_per_deg_lon: f64,
}

impl LocalFrame {
    /// Frame whose tangent point is `origin`.
    pub fn at(origin: GeoPoint) -> Self {
        let m_per_deg_lat = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        Self {
            origin,
            m_per_deg_lat,
            m_per_deg_lon: m_per_deg_lat * origin.latitude.to_radians().cos(),
        }
    }

    /// Frame centered on the mean latitude/longitude of `points`; `None` if empty.
    pub fn centered_on(points: &[GeoPoint]) -> Option<Self> {
        centroid(points).map(Self::at)
    }

    #[inline]
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// `(east, north)` metres relative to the frame origin.
    #[inline]
    pub fn project(&self, p: GeoPoint) -> Vector2<f64> {
        Vector2::new(
            (p.longitude - self.origin.longitude) * self.m_per_deg_lon,
            (p.latitude - self.origin.latitude) * self.m_per_deg_lat,
        )
    }

    #[inline]
    pub fn unproject(&self, v: Vector2<f64>) -> GeoPoint {
        GeoPoint::new(
            self.origin.latitude + v.y / self.m_per_deg_lat,
            self.origin.longitude + v.x / self.m_per_deg_lon,
        )
    }

    pub fn project_all(&self, points: &[GeoPoint]) -> Vec<Vector2<f64>> {
        points.iter().map(|p| self.project(*p)).collect()
    }
}

/// Signed shoelace area of an open planar ring (CCW positive).
pub fn shoelace_signed(ring: &[Vector2<f64>]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice / 2.0
}

/// Unsigned area in m² of a geographic ring; 0 for fewer than 3 vertices.
pub fn polygon_area_m2(ring: &[GeoPoint]) -> f64 {
    let Some(frame) = LocalFrame::centered_on(ring) else {
        return 0.0;
    };
    shoelace_signed(&frame.project_all(ring)).abs()
}

/// Arithmetic mean of the vertices.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points.iter().fold((0.0, 0.0), |(lat, lon), p| {
        (lat + p.latitude, lon + p.longitude)
    });
    Some(GeoPoint::new(lat / n, lon / n))
}

/// Sum of haversine distances along an open path.
pub fn path_length_m(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Path length plus the implicit closing edge.
pub fn ring_perimeter_m(ring: &[GeoPoint]) -> f64 {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() >= 2 => {
            path_length_m(ring) + haversine_m(*last, *first)
        }
        _ => 0.0,
    }
}
