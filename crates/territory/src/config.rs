//! Game thresholds, injected into every component at construction.
//!
//! Policy
//! - One immutable `GameConfig` value is shared (by copy) between the filter,
//!   detector, finalizer, cooldown tracker and guard. Nothing reads globals, so
//!   tests can vary a single threshold without touching process-wide state.
//! - JSON overrides are partial: a missing key keeps its default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Thresholds for sampling, closure, validation, cooldowns and encroachment.
///
/// Distances are metres, areas square metres, durations seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// A lootable POI closer than this pops up for the player.
    pub poi_trigger_radius_m: f64,
    /// Radius around the player in which land is offered for claiming.
    pub claim_radius_m: f64,
    pub poi_respawn_seconds: f64,
    /// Spacing throttle between accepted samples.
    pub sampling_min_distance_m: f64,
    /// Accepted points required before a loop may close.
    pub sampling_min_points: usize,
    pub sampling_max_accuracy_m: f64,
    /// Longer single steps are treated as GPS glitches or teleports.
    pub sampling_max_step_distance_m: f64,
    pub sampling_max_speed_kmh: f64,
    /// Maximum distance between the newest point and the origin for closure.
    pub territory_close_distance_m: f64,
    pub territory_min_area_m2: f64,
    pub territory_max_area_m2: f64,
    /// Minimum short side of the bounding box.
    pub territory_min_span_m: f64,
    pub encroach_danger_m: f64,
    pub encroach_warning_m: f64,
    pub encroach_caution_m: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            poi_trigger_radius_m: 80.0,
            claim_radius_m: 150.0,
            poi_respawn_seconds: 86_400.0,
            sampling_min_distance_m: 10.0,
            sampling_min_points: 5,
            sampling_max_accuracy_m: 25.0,
            sampling_max_step_distance_m: 80.0,
            sampling_max_speed_kmh: 20.0,
            territory_close_distance_m: 25.0,
            territory_min_area_m2: 100.0,
            territory_max_area_m2: 10_000_000.0,
            territory_min_span_m: 8.0,
            encroach_danger_m: 25.0,
            encroach_warning_m: 50.0,
            encroach_caution_m: 100.0,
        }
    }
}

impl GameConfig {
    /// Speed limit in metres per second.
    #[inline]
    pub fn sampling_max_speed_mps(&self) -> f64 {
        self.sampling_max_speed_kmh / 3.6
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Reject thresholds that would make the capture rules meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("poi_trigger_radius_m", self.poi_trigger_radius_m),
            ("claim_radius_m", self.claim_radius_m),
            ("poi_respawn_seconds", self.poi_respawn_seconds),
            ("sampling_min_distance_m", self.sampling_min_distance_m),
            ("sampling_max_accuracy_m", self.sampling_max_accuracy_m),
            ("sampling_max_step_distance_m", self.sampling_max_step_distance_m),
            ("sampling_max_speed_kmh", self.sampling_max_speed_kmh),
            ("territory_close_distance_m", self.territory_close_distance_m),
            ("territory_min_area_m2", self.territory_min_area_m2),
            ("territory_max_area_m2", self.territory_max_area_m2),
            ("territory_min_span_m", self.territory_min_span_m),
            ("encroach_danger_m", self.encroach_danger_m),
            ("encroach_warning_m", self.encroach_warning_m),
            ("encroach_caution_m", self.encroach_caution_m),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.sampling_min_points < 3 {
            return Err(ConfigError::Invalid(format!(
                "sampling_min_points must be at least 3, got {}",
                self.sampling_min_points
            )));
        }
        if self.sampling_min_distance_m > self.sampling_max_step_distance_m {
            return Err(ConfigError::Invalid(
                "sampling_min_distance_m exceeds sampling_max_step_distance_m".to_string(),
            ));
        }
        if self.territory_min_area_m2 > self.territory_max_area_m2 {
            return Err(ConfigError::Invalid(
                "territory_min_area_m2 exceeds territory_max_area_m2".to_string(),
            ));
        }
        if !(self.encroach_danger_m <= self.encroach_warning_m
            && self.encroach_warning_m <= self.encroach_caution_m)
        {
            return Err(ConfigError::Invalid(
                "encroachment radii must satisfy danger <= warning <= caution".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read game config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid game config: {0}")]
    Invalid(String),
}
