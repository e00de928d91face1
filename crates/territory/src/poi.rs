//! Scavenge cooldowns for resource points (POIs).
//!
//! Lootability is always computed on demand from the stored
//! `last_scavenged_at`; no timers are scheduled. Scavenging returns a new `Poi`
//! value which the caller persists.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::geo::{haversine_m, GeoPoint};
use crate::sampling::Timestamp;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: Uuid,
    pub location: GeoPoint,
    pub last_scavenged_at: Option<Timestamp>,
}

impl Poi {
    /// A never-scavenged POI.
    pub fn new(id: Uuid, location: GeoPoint) -> Self {
        Self {
            id,
            location,
            last_scavenged_at: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PoiCooldownTracker {
    respawn_seconds: f64,
    trigger_radius_m: f64,
}

impl PoiCooldownTracker {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            respawn_seconds: cfg.poi_respawn_seconds,
            trigger_radius_m: cfg.poi_trigger_radius_m,
        }
    }

    /// Never scavenged, or the respawn period has fully elapsed.
    pub fn is_lootable(&self, poi: &Poi, now: Timestamp) -> bool {
        match poi.last_scavenged_at {
            None => true,
            Some(at) => now.seconds_since(at) >= self.respawn_seconds,
        }
    }

    pub fn mark_scavenged(&self, poi: &Poi, now: Timestamp) -> Poi {
        Poi {
            last_scavenged_at: Some(now),
            ..poi.clone()
        }
    }

    /// Seconds until lootable again, in `[0, respawn_seconds]`.
    pub fn respawn_remaining_s(&self, poi: &Poi, now: Timestamp) -> f64 {
        match poi.last_scavenged_at {
            None => 0.0,
            Some(at) => {
                (self.respawn_seconds - now.seconds_since(at)).clamp(0.0, self.respawn_seconds)
            }
        }
    }

    /// Closest lootable POI within the trigger radius of `here`.
    pub fn triggered<'a>(
        &self,
        pois: &'a [Poi],
        here: GeoPoint,
        now: Timestamp,
    ) -> Option<&'a Poi> {
        pois.iter()
            .filter(|p| self.is_lootable(p, now))
            .map(|p| (p, haversine_m(here, p.location)))
            .filter(|(_, d)| *d <= self.trigger_radius_m)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }
}
