//! Encroachment warnings against other players' territories.
//!
//! A location inside a foreign territory is a `Violation`; otherwise the level is
//! graded by the distance to the nearest foreign ring vertex. The player's own
//! territories are ignored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::Territory;
use crate::config::GameConfig;
use crate::geo::{haversine_m, GeoPoint};

/// Ordered from harmless to forbidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    Safe,
    Caution,
    Warning,
    Danger,
    Violation,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Encroachment {
    pub level: WarningLevel,
    /// Distance to the nearest foreign vertex; `None` with no foreign territory.
    pub closest_m: Option<f64>,
    /// The territory that set the level.
    pub territory: Option<Uuid>,
}

impl Encroachment {
    fn safe() -> Self {
        Self {
            level: WarningLevel::Safe,
            closest_m: None,
            territory: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TerritoryGuard {
    danger_m: f64,
    warning_m: f64,
    caution_m: f64,
}

impl TerritoryGuard {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            danger_m: cfg.encroach_danger_m,
            warning_m: cfg.encroach_warning_m,
            caution_m: cfg.encroach_caution_m,
        }
    }

    fn grade(&self, distance_m: f64) -> WarningLevel {
        if distance_m < self.danger_m {
            WarningLevel::Danger
        } else if distance_m < self.warning_m {
            WarningLevel::Warning
        } else if distance_m < self.caution_m {
            WarningLevel::Caution
        } else {
            WarningLevel::Safe
        }
    }

    /// Assess `here` against every territory not owned by `owner_id`.
    pub fn assess(
        &self,
        here: GeoPoint,
        owner_id: &str,
        territories: &[Territory],
    ) -> Encroachment {
        let foreign = territories.iter().filter(|t| t.owner_id() != owner_id);

        let mut best = Encroachment::safe();
        for t in foreign {
            if t.contains(here) {
                tracing::debug!(territory = %t.id(), "inside foreign territory");
                return Encroachment {
                    level: WarningLevel::Violation,
                    closest_m: Some(0.0),
                    territory: Some(t.id()),
                };
            }
            let Some(d) = t
                .polygon()
                .iter()
                .map(|v| haversine_m(here, *v))
                .min_by(f64::total_cmp)
            else {
                continue;
            };
            if best.closest_m.map_or(true, |b| d < b) {
                best = Encroachment {
                    level: self.grade(d),
                    closest_m: Some(d),
                    territory: Some(t.id()),
                };
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureSession, ClosedSession, PolygonFinalizer};
    use crate::sampling::{PathPoint, Timestamp};

    const HOME: GeoPoint = GeoPoint::new(31.23, 121.47);

    /// Committed 50 m square with its south-west corner at `sw`.
    fn square(owner: &str, sw: GeoPoint) -> Territory {
        let corners = [(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0), (0.0, 10.0)];
        let mut t = Timestamp::from_secs(0.0);
        let mut session = CaptureSession::new(PathPoint::new(sw, t));
        for (e, n) in corners.iter().skip(1) {
            t = t.plus_secs(30.0);
            session.append(PathPoint::new(sw.offset_m(*e, *n), t));
        }
        let d = session.distance_to_origin_m();
        PolygonFinalizer::new(&GameConfig::default())
            .finalize(ClosedSession::new(session, d), owner, t)
            .unwrap()
    }

    fn guard() -> TerritoryGuard {
        TerritoryGuard::new(&GameConfig::default())
    }

    #[test]
    fn nothing_around_is_safe() {
        let e = guard().assess(HOME, "me", &[]);
        assert_eq!(e.level, WarningLevel::Safe);
        assert!(e.closest_m.is_none());
    }

    #[test]
    fn inside_foreign_is_violation_but_own_is_ignored() {
        let theirs = square("them", HOME);
        let here = HOME.offset_m(25.0, 25.0);
        let e = guard().assess(here, "me", std::slice::from_ref(&theirs));
        assert_eq!(e.level, WarningLevel::Violation);
        assert_eq!(e.territory, Some(theirs.id()));

        let e = guard().assess(here, "them", &[theirs]);
        assert_eq!(e.level, WarningLevel::Safe);
    }

    #[test]
    fn distance_grades_level() {
        let theirs = vec![square("them", HOME)];
        // West of the square; nearest vertex is the south-west corner.
        let at = |west: f64| guard().assess(HOME.offset_m(-west, 0.0), "me", &theirs).level;
        assert_eq!(at(10.0), WarningLevel::Danger);
        assert_eq!(at(40.0), WarningLevel::Warning);
        assert_eq!(at(80.0), WarningLevel::Caution);
        assert_eq!(at(150.0), WarningLevel::Safe);
    }

    #[test]
    fn nearest_territory_wins() {
        let near = square("a", HOME);
        let far = square("b", HOME.offset_m(0.0, 300.0));
        let e = guard().assess(HOME.offset_m(-30.0, 0.0), "me", &[far, near.clone()]);
        assert_eq!(e.territory, Some(near.id()));
        assert!((e.closest_m.unwrap() - 30.0).abs() < 0.1);
        assert!(WarningLevel::Violation > WarningLevel::Danger);
    }
}
