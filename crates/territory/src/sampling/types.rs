//! Sensor readings and accepted samples.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Seconds since an arbitrary, caller-chosen epoch.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    #[inline]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// `self - earlier` in seconds (negative if `earlier` is later).
    #[inline]
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn plus_secs(self, secs: f64) -> Self {
        Self(self.0 + secs)
    }
}

/// One raw GPS reading as delivered by the location provider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub point: GeoPoint,
    pub horizontal_accuracy_m: f64,
    pub timestamp: Timestamp,
    /// Device-reported ground speed; negative values mean "unknown" on some platforms.
    pub speed_mps: Option<f64>,
}

impl LocationFix {
    pub fn new(point: GeoPoint, horizontal_accuracy_m: f64, timestamp: Timestamp) -> Self {
        Self {
            point,
            horizontal_accuracy_m,
            timestamp,
            speed_mps: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    /// Reported speed if it is usable (finite and non-negative).
    #[inline]
    pub fn reported_speed_mps(&self) -> Option<f64> {
        self.speed_mps.filter(|s| s.is_finite() && *s >= 0.0)
    }

    #[inline]
    pub fn to_path_point(&self) -> PathPoint {
        PathPoint {
            point: self.point,
            timestamp: self.timestamp,
        }
    }
}

/// A fix that passed the sample filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub point: GeoPoint,
    pub timestamp: Timestamp,
}

impl PathPoint {
    #[inline]
    pub fn new(point: GeoPoint, timestamp: Timestamp) -> Self {
        Self { point, timestamp }
    }
}
