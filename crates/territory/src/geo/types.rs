//! Coordinate values, haversine distance and lat/lon bounding boxes.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for every distance and projection in the crate.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 latitude/longitude in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside [-90, 90] × [-180, 180].
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    #[inline]
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        haversine_m(*self, *other)
    }

    /// Point displaced by `east_m`/`north_m` in the tangent plane at `self`.
    ///
    /// Inverse of `LocalFrame::project` for a frame anchored at `self`.
    pub fn offset_m(&self, east_m: f64, north_m: f64) -> GeoPoint {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let dlon = (east_m / (EARTH_RADIUS_M * self.latitude.to_radians().cos())).to_degrees();
        GeoPoint::new(self.latitude + dlat, self.longitude + dlon)
    }
}

/// Great-circle distance in metres.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Axis-aligned lat/lon box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };
        for p in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(p.latitude);
            bbox.max_lat = bbox.max_lat.max(p.latitude);
            bbox.min_lon = bbox.min_lon.min(p.longitude);
            bbox.max_lon = bbox.max_lon.max(p.longitude);
        }
        Some(bbox)
    }

    #[inline]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// `(east-west, north-south)` extent in metres, measured at the box center.
    pub fn extent_m(&self) -> (f64, f64) {
        let mid_lat = self.center().latitude.to_radians();
        let width = (self.max_lon - self.min_lon).to_radians() * EARTH_RADIUS_M * mid_lat.cos();
        let height = (self.max_lat - self.min_lat).to_radians() * EARTH_RADIUS_M;
        (width, height)
    }

    /// Shorter side in metres (the polygon span).
    pub fn short_side_m(&self) -> f64 {
        let (w, h) = self.extent_m();
        w.min(h)
    }

    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.latitude)
            && (self.min_lon..=self.max_lon).contains(&p.longitude)
    }
}
