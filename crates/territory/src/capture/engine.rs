//! The capture state machine.

use thiserror::Error;

use super::detector::LoopDetector;
use super::finalize::{PolygonFinalizer, Rejected, Territory, ValidationError};
use super::snapshot::{CaptureSnapshot, SnapshotHandle};
use super::types::{CaptureSession, CaptureState, Phase};
use crate::config::GameConfig;
use crate::geo::GeoPoint;
use crate::sampling::{
    screen, LocationFix, PathPoint, RejectReason, SampleFilter, Timestamp, Verdict,
};

/// What happened to one fix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FixOutcome {
    Appended { count: usize },
    /// The fix was appended and closed the loop; the engine is now `Closing`.
    LoopClosed {
        count: usize,
        distance_to_origin_m: f64,
    },
    Rejected(RejectReason),
    /// No session is sampling; the fix was ignored.
    Inactive,
}

/// Recoverable misuse of the engine by its caller.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum CaptureError {
    #[error("a capture session is already active")]
    SessionActive,
    #[error("no active capture session")]
    NoActiveSession,
    #[error("origin is not a valid coordinate or timestamp")]
    InvalidOrigin,
    /// The fix offered as origin failed the sample filter.
    #[error("origin fix rejected: {0}")]
    OriginRejected(RejectReason),
}

/// Single-writer orchestrator for one player's captures.
///
/// Every method runs synchronously and returns before the next fix is due.
/// Other threads observe progress through `snapshots()`.
#[derive(Debug)]
pub struct TerritoryCaptureEngine {
    owner_id: String,
    filter: SampleFilter,
    detector: LoopDetector,
    finalizer: PolygonFinalizer,
    state: CaptureState,
    snapshots: SnapshotHandle,
}

impl TerritoryCaptureEngine {
    pub fn new(cfg: &GameConfig, owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            filter: SampleFilter::new(cfg),
            detector: LoopDetector::new(cfg),
            finalizer: PolygonFinalizer::new(cfg),
            state: CaptureState::Idle,
            snapshots: SnapshotHandle::default(),
        }
    }

    #[inline]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    #[inline]
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Read handle that stays valid across sessions.
    pub fn snapshots(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }

    /// The territory of the last successful capture, while `Committed`.
    pub fn committed(&self) -> Option<&Territory> {
        match &self.state {
            CaptureState::Committed(t) => Some(t),
            _ => None,
        }
    }

    /// Begin a session at `origin`. Allowed from `Idle`, `Committed` and `Aborted`.
    ///
    /// The origin is taken as-is; use `start_from_fix` to gate it on fix
    /// quality like every later point.
    pub fn start(&mut self, origin: GeoPoint, at: Timestamp) -> Result<(), CaptureError> {
        if self.phase().is_active() {
            return Err(CaptureError::SessionActive);
        }
        if !origin.is_valid() || !at.secs().is_finite() {
            return Err(CaptureError::InvalidOrigin);
        }
        self.begin(PathPoint::new(origin, at));
        Ok(())
    }

    /// Begin a session whose origin is `fix`, provided it passes the same
    /// screening and accuracy gate as every other sample.
    pub fn start_from_fix(&mut self, fix: LocationFix) -> Result<(), CaptureError> {
        if self.phase().is_active() {
            return Err(CaptureError::SessionActive);
        }
        if let Err(malformed) = screen(&fix, None) {
            return Err(CaptureError::OriginRejected(malformed.into()));
        }
        match self.filter.accept(&fix, None) {
            Verdict::Accepted(origin) => {
                self.begin(origin);
                Ok(())
            }
            Verdict::Rejected(reason) => {
                tracing::debug!(%reason, t = fix.timestamp.secs(), "origin fix rejected");
                Err(CaptureError::OriginRejected(reason))
            }
        }
    }

    fn begin(&mut self, origin: PathPoint) {
        self.state = CaptureState::Sampling(CaptureSession::new(origin));
        tracing::info!(
            owner = %self.owner_id,
            lat = origin.point.latitude,
            lon = origin.point.longitude,
            "capture started"
        );
        self.publish();
    }

    /// Screen, filter and append one fix; detects closure on acceptance.
    pub fn push_fix(&mut self, fix: LocationFix) -> FixOutcome {
        let CaptureState::Sampling(session) = &mut self.state else {
            return FixOutcome::Inactive;
        };
        let previous = *session.last();
        let verdict = match screen(&fix, Some(&previous)) {
            Ok(()) => self.filter.accept(&fix, Some(&previous)),
            Err(malformed) => Verdict::Rejected(malformed.into()),
        };
        let point = match verdict {
            Verdict::Accepted(point) => point,
            Verdict::Rejected(reason) => {
                if reason.is_throttle() {
                    tracing::trace!(%reason, "fix throttled");
                } else {
                    tracing::debug!(%reason, t = fix.timestamp.secs(), "fix rejected");
                }
                return FixOutcome::Rejected(reason);
            }
        };
        session.append(point);
        self.detector.observe(session);
        let count = session.path().count();
        tracing::debug!(
            count,
            walked_m = session.path().walked_m(),
            to_origin_m = session.distance_to_origin_m(),
            "fix accepted"
        );

        let mut outcome = FixOutcome::Appended { count };
        self.state = match std::mem::take(&mut self.state) {
            CaptureState::Sampling(session) => match self.detector.close(session) {
                Ok(closed) => {
                    tracing::info!(
                        count,
                        distance_to_origin_m = closed.distance_to_origin_m(),
                        "loop closed"
                    );
                    outcome = FixOutcome::LoopClosed {
                        count,
                        distance_to_origin_m: closed.distance_to_origin_m(),
                    };
                    CaptureState::Closing(closed)
                }
                Err(open) => CaptureState::Sampling(open),
            },
            other => other,
        };
        self.publish();
        outcome
    }

    /// Validate the closed loop and commit it, or reopen the session.
    ///
    /// The completion time is the timestamp of the point that closed the loop.
    ///
    /// # Panics
    /// If the engine is not `Closing`: calling this earlier is a defect in the
    /// calling layer, not a player-facing error.
    pub fn finalize(&mut self) -> Result<Territory, ValidationError> {
        let closed = match std::mem::take(&mut self.state) {
            CaptureState::Closing(closed) => closed,
            other => {
                let phase = other.phase();
                self.state = other;
                panic!("finalize called while {phase:?}; only a Closing session can be finalized");
            }
        };
        let completed_at = closed.session().last().timestamp;
        let result = match self.finalizer.finalize(closed, &self.owner_id, completed_at) {
            Ok(territory) => {
                tracing::info!(
                    id = %territory.id(),
                    area_m2 = territory.area_m2(),
                    points = territory.point_count(),
                    "territory committed"
                );
                self.state = CaptureState::Committed(territory.clone());
                Ok(territory)
            }
            Err(Rejected { reason, session }) => {
                tracing::warn!(
                    %reason,
                    points = session.path().count(),
                    "loop rejected, keep walking"
                );
                self.state = CaptureState::Sampling(session);
                Err(reason)
            }
        };
        self.publish();
        result
    }

    /// Discard the live session.
    pub fn cancel(&mut self) -> Result<(), CaptureError> {
        let Some(session) = self.state.session() else {
            return Err(CaptureError::NoActiveSession);
        };
        tracing::info!(points = session.path().count(), "capture cancelled");
        self.state = CaptureState::Aborted;
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        self.snapshots.publish(CaptureSnapshot::of(&self.state));
    }
}
