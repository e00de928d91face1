//! Session and state types for the capture state machine.

use serde::{Deserialize, Serialize};

use super::finalize::Territory;
use crate::geo::{haversine_m, GeoPoint};
use crate::sampling::{PathAccumulator, PathPoint, Timestamp};

/// Mutable state of one in-progress capture.
///
/// Invariants:
/// - `path` is non-empty and `path.first()` is the origin.
/// - The origin is fixed at session start.
/// - `armed` is set once a point lands outside the close distance, and cleared
///   when a rejected loop is reopened.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureSession {
    origin: GeoPoint,
    started_at: Timestamp,
    path: PathAccumulator,
    armed: bool,
}

impl CaptureSession {
    /// New session whose first accepted point is `origin`.
    pub fn new(origin: PathPoint) -> Self {
        let mut path = PathAccumulator::new();
        path.append(origin);
        Self {
            origin: origin.point,
            started_at: origin.timestamp,
            path,
            armed: false,
        }
    }

    #[inline]
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    #[inline]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    #[inline]
    pub fn path(&self) -> &PathAccumulator {
        &self.path
    }

    /// Newest accepted point (the origin right after start).
    #[inline]
    pub fn last(&self) -> &PathPoint {
        // `new` seeds the path and nothing removes from it.
        &self.path.points()[self.path.count() - 1]
    }

    pub fn distance_to_origin_m(&self) -> f64 {
        haversine_m(self.last().point, self.origin)
    }

    /// Whether the path has left the origin's close radius since the session
    /// started or was last reopened.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub(crate) fn append(&mut self, point: PathPoint) {
        self.path.append(point);
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }
}

/// A session whose path closed against its origin.
///
/// Constructed only by `LoopDetector::close`, so finalizing an open loop is not
/// expressible.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosedSession {
    session: CaptureSession,
    distance_to_origin_m: f64,
}

impl ClosedSession {
    pub(crate) fn new(session: CaptureSession, distance_to_origin_m: f64) -> Self {
        Self {
            session,
            distance_to_origin_m,
        }
    }

    #[inline]
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    #[inline]
    pub fn distance_to_origin_m(&self) -> f64 {
        self.distance_to_origin_m
    }

    /// Back to an open session (validation failed, keep walking).
    ///
    /// The session is disarmed: it closes again only after the path leaves the
    /// origin's close radius and comes back.
    pub fn reopen(self) -> CaptureSession {
        let mut session = self.session;
        session.armed = false;
        session
    }
}

/// Capture state with the data each state owns.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CaptureState {
    #[default]
    Idle,
    Sampling(CaptureSession),
    Closing(ClosedSession),
    Committed(Territory),
    Aborted,
}

impl CaptureState {
    pub fn phase(&self) -> Phase {
        match self {
            CaptureState::Idle => Phase::Idle,
            CaptureState::Sampling(_) => Phase::Sampling,
            CaptureState::Closing(_) => Phase::Closing,
            CaptureState::Committed(_) => Phase::Committed,
            CaptureState::Aborted => Phase::Aborted,
        }
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<&CaptureSession> {
        match self {
            CaptureState::Sampling(s) => Some(s),
            CaptureState::Closing(c) => Some(c.session()),
            _ => None,
        }
    }
}

/// Payload-free view of `CaptureState`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Sampling,
    Closing,
    Committed,
    Aborted,
}

impl Phase {
    /// Sampling or Closing.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Sampling | Phase::Closing)
    }
}
