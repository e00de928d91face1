//! Closed-loop detection against the session origin.

use super::types::{CaptureSession, ClosedSession};
use crate::config::GameConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Closure {
    Open,
    Closed { distance_to_origin_m: f64 },
}

/// Edge-triggered closure check, evaluated after every successful append.
#[derive(Clone, Copy, Debug)]
pub struct LoopDetector {
    close_distance_m: f64,
    min_points: usize,
}

impl LoopDetector {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            close_distance_m: cfg.territory_close_distance_m,
            min_points: cfg.sampling_min_points,
        }
    }

    /// Arm `session` when its newest point lies outside the close distance.
    /// Called after every append.
    pub(crate) fn observe(&self, session: &mut CaptureSession) {
        if session.distance_to_origin_m() > self.close_distance_m {
            session.arm();
        }
    }

    /// Closed iff the session is armed, the path has enough points and its
    /// newest point is within the close distance of the origin.
    pub fn check_closure(&self, session: &CaptureSession) -> Closure {
        if !session.is_armed() || session.path().count() < self.min_points {
            return Closure::Open;
        }
        let d = session.distance_to_origin_m();
        if d <= self.close_distance_m {
            Closure::Closed {
                distance_to_origin_m: d,
            }
        } else {
            Closure::Open
        }
    }

    /// Promote `session` to a `ClosedSession`, or give it back unchanged.
    pub fn close(&self, session: CaptureSession) -> Result<ClosedSession, CaptureSession> {
        match self.check_closure(&session) {
            Closure::Closed {
                distance_to_origin_m,
            } => Ok(ClosedSession::new(session, distance_to_origin_m)),
            Closure::Open => Err(session),
        }
    }
}
