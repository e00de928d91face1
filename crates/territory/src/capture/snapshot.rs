//! Immutable, atomically published views of the capture state.
//!
//! The engine is the single writer. After each mutation it builds a fresh
//! `CaptureSnapshot` and stores it in an `ArcSwap`; readers take an owned `Arc`
//! without locking and never see a half-applied append.

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::types::{CaptureState, Phase};
use crate::geo::GeoPoint;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureSnapshot {
    pub phase: Phase,
    pub points: Vec<GeoPoint>,
    pub walked_m: f64,
    pub estimated_area_m2: f64,
    /// `None` without a live session.
    pub distance_to_origin_m: Option<f64>,
}

impl CaptureSnapshot {
    pub fn of(state: &CaptureState) -> Self {
        let phase = state.phase();
        match state.session() {
            Some(s) => CaptureSnapshot {
                phase,
                points: s.path().vertices(),
                walked_m: s.path().walked_m(),
                estimated_area_m2: s.path().estimated_area_m2(),
                distance_to_origin_m: Some(s.distance_to_origin_m()),
            },
            None => CaptureSnapshot {
                phase,
                ..CaptureSnapshot::default()
            },
        }
    }
}

/// Cloneable read handle; `Send + Sync`.
#[derive(Clone, Debug)]
pub struct SnapshotHandle {
    inner: Arc<ArcSwap<CaptureSnapshot>>,
}

impl Default for SnapshotHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(CaptureSnapshot::default())),
        }
    }
}

impl SnapshotHandle {
    /// Latest published snapshot. The returned `Arc` stays consistent even if
    /// the engine publishes again while the caller holds it.
    pub fn load(&self) -> Arc<CaptureSnapshot> {
        self.inner.load_full()
    }

    pub(crate) fn publish(&self, snapshot: CaptureSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }
}
