//! Accept/reject rules for raw fixes.

use thiserror::Error;

use super::types::{LocationFix, PathPoint};
use crate::config::GameConfig;
use crate::geo::haversine_m;

/// Why a fix did not become a path point.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RejectReason {
    #[error("horizontal accuracy {accuracy_m:.1} m exceeds {limit_m:.1} m")]
    LowAccuracy { accuracy_m: f64, limit_m: f64 },
    /// Spacing throttle: not an error, the next sample is just not due yet.
    #[error("only {distance_m:.1} m from the previous point")]
    TooSoon { distance_m: f64 },
    #[error("step of {distance_m:.1} m exceeds {limit_m:.1} m")]
    ImplausibleJump { distance_m: f64, limit_m: f64 },
    #[error("speed {speed_kmh:.1} km/h exceeds {limit_kmh:.1} km/h")]
    ImplausibleSpeed { speed_kmh: f64, limit_kmh: f64 },
    #[error("malformed fix: {0}")]
    Malformed(#[from] MalformedFix),
}

impl RejectReason {
    /// True for the spacing throttle, which callers usually do not surface.
    #[inline]
    pub fn is_throttle(&self) -> bool {
        matches!(self, RejectReason::TooSoon { .. })
    }

    /// Stable snake_case label, for tallies and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::LowAccuracy { .. } => "low_accuracy",
            RejectReason::TooSoon { .. } => "too_soon",
            RejectReason::ImplausibleJump { .. } => "implausible_jump",
            RejectReason::ImplausibleSpeed { .. } => "implausible_speed",
            RejectReason::Malformed(_) => "malformed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MalformedFix {
    #[error("coordinate is not finite or out of range")]
    BadCoordinate,
    #[error("accuracy is not a positive finite number")]
    BadAccuracy,
    #[error("timestamp is not finite")]
    BadTimestamp,
    #[error("timestamp precedes the previous accepted point")]
    OutOfOrder,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Accepted(PathPoint),
    Rejected(RejectReason),
}

impl Verdict {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Structural validity of a fix, checked before any game rule.
pub fn screen(fix: &LocationFix, previous: Option<&PathPoint>) -> Result<(), MalformedFix> {
    if !fix.point.is_valid() {
        return Err(MalformedFix::BadCoordinate);
    }
    if !fix.horizontal_accuracy_m.is_finite() || fix.horizontal_accuracy_m <= 0.0 {
        return Err(MalformedFix::BadAccuracy);
    }
    if !fix.timestamp.secs().is_finite() {
        return Err(MalformedFix::BadTimestamp);
    }
    if let Some(prev) = previous {
        if fix.timestamp < prev.timestamp {
            return Err(MalformedFix::OutOfOrder);
        }
    }
    Ok(())
}

/// Noise and anti-spoof gate between the location stream and the path.
///
/// Pure: the verdict depends only on `(fix, previous)` and the injected config.
#[derive(Clone, Copy, Debug)]
pub struct SampleFilter {
    max_accuracy_m: f64,
    min_distance_m: f64,
    max_step_m: f64,
    max_speed_mps: f64,
}

impl SampleFilter {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            max_accuracy_m: cfg.sampling_max_accuracy_m,
            min_distance_m: cfg.sampling_min_distance_m,
            max_step_m: cfg.sampling_max_step_distance_m,
            max_speed_mps: cfg.sampling_max_speed_mps(),
        }
    }

    /// Apply the rules in order: accuracy, spacing, step, speed.
    pub fn accept(&self, fix: &LocationFix, previous: Option<&PathPoint>) -> Verdict {
        if fix.horizontal_accuracy_m > self.max_accuracy_m {
            return Verdict::Rejected(RejectReason::LowAccuracy {
                accuracy_m: fix.horizontal_accuracy_m,
                limit_m: self.max_accuracy_m,
            });
        }
        let Some(prev) = previous else {
            return Verdict::Accepted(fix.to_path_point());
        };

        let distance_m = haversine_m(fix.point, prev.point);
        if distance_m < self.min_distance_m {
            return Verdict::Rejected(RejectReason::TooSoon { distance_m });
        }
        if distance_m > self.max_step_m {
            return Verdict::Rejected(RejectReason::ImplausibleJump {
                distance_m,
                limit_m: self.max_step_m,
            });
        }

        let speed_mps = effective_speed_mps(fix, prev, distance_m);
        if speed_mps > self.max_speed_mps {
            return Verdict::Rejected(RejectReason::ImplausibleSpeed {
                speed_kmh: speed_mps * 3.6,
                limit_kmh: self.max_speed_mps * 3.6,
            });
        }
        Verdict::Accepted(fix.to_path_point())
    }
}

/// Larger of the reported speed and distance / elapsed time.
///
/// A non-zero step with no elapsed time is infinitely fast.
fn effective_speed_mps(fix: &LocationFix, prev: &PathPoint, distance_m: f64) -> f64 {
    let elapsed = fix.timestamp.seconds_since(prev.timestamp);
    let derived = if elapsed > 0.0 {
        distance_m / elapsed
    } else if distance_m > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    derived.max(fix.reported_speed_mps().unwrap_or(0.0))
}
