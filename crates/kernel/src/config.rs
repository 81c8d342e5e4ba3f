//! Session tunables.
//!
//! Every gameplay constant that a designer may want to change lives here and
//! can be overridden from a JSON file. Missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a [`SessionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Day/night cycle timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayConfig {
    /// Seconds for one full revolution of the sun.
    pub day_length_seconds: f32,
    /// Seconds added to the clock before computing the phase, so a round
    /// starts in the morning.
    pub phase_offset_seconds: f32,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            day_length_seconds: 120.0,
            phase_offset_seconds: 30.0,
        }
    }
}

/// Arena layout: walls, trees and spawn ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub tree_count: usize,
    /// Trees are scattered uniformly in `[-tree_extent, tree_extent]` on x and z.
    pub tree_extent: f32,
    /// Distance from the origin to each wall's center line.
    pub wall_distance: f32,
    pub wall_length: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    /// The player may not leave `[-player_bound, player_bound]` on x and z.
    pub player_bound: f32,
    /// Hostiles enter this far from the origin.
    pub hostile_spawn_distance: f32,
    /// Lateral spread of hostile entry points and random heart drops.
    pub spawn_spread: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tree_count: 30,
            tree_extent: 40.0,
            wall_distance: 50.5,
            wall_length: 100.0,
            wall_height: 6.0,
            wall_thickness: 1.0,
            player_bound: 48.5,
            hostile_spawn_distance: 65.0,
            spawn_spread: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub initial_health: u32,
    pub max_health: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_health: 2,
            max_health: 5,
        }
    }
}

/// Per-frame spawn probabilities and score gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Chance per frame that a hostile enters.
    pub hostile_chance: f32,
    /// Chance per frame that a heart appears somewhere in the arena.
    pub heart_chance: f32,
    /// Score at which SUPER hostiles may appear.
    pub super_min_score: u32,
    /// Roll below which an eligible spawn becomes SUPER.
    pub super_roll: f32,
    /// Score at which MINI hostiles may appear.
    pub mini_min_score: u32,
    /// Roll below which an eligible spawn becomes MINI.
    pub mini_roll: f32,
    /// Chance that a killed hostile drops a heart.
    pub drop_chance: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            hostile_chance: 0.01,
            heart_chance: 0.0005,
            super_min_score: 100,
            super_roll: 0.1,
            mini_min_score: 300,
            mini_roll: 0.25,
            drop_chance: 0.10,
        }
    }
}

/// Everything needed to start a reproducible session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for tree layout, spawns and drop rolls.
    pub seed: u64,
    pub day: DayConfig,
    pub arena: ArenaConfig,
    pub player: PlayerConfig,
    pub spawn: SpawnConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            day: DayConfig::default(),
            arena: ArenaConfig::default(),
            player: PlayerConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Default config with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), seed = config.seed, "loaded session config");
        Ok(config)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.day.day_length_seconds.is_finite() && self.day.day_length_seconds > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "day_length_seconds must be positive, got {}",
                self.day.day_length_seconds
            )));
        }
        if self.player.max_health == 0 {
            return Err(ConfigError::Invalid("max_health must be at least 1".into()));
        }
        if self.player.initial_health == 0 || self.player.initial_health > self.player.max_health {
            return Err(ConfigError::Invalid(format!(
                "initial_health {} outside 1..={}",
                self.player.initial_health, self.player.max_health
            )));
        }
        let probabilities = [
            ("hostile_chance", self.spawn.hostile_chance),
            ("heart_chance", self.spawn.heart_chance),
            ("super_roll", self.spawn.super_roll),
            ("mini_roll", self.spawn.mini_roll),
            ("drop_chance", self.spawn.drop_chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if !(self.arena.spawn_spread.is_finite() && self.arena.spawn_spread > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "spawn_spread must be positive, got {}",
                self.arena.spawn_spread
            )));
        }
        if !(self.arena.tree_extent.is_finite() && self.arena.tree_extent >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tree_extent must be non-negative, got {}",
                self.arena.tree_extent
            )));
        }
        if self.arena.player_bound <= 0.0 || self.arena.player_bound >= self.arena.wall_distance {
            return Err(ConfigError::Invalid(format!(
                "player_bound {} must lie inside the walls at {}",
                self.arena.player_bound, self.arena.wall_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            SessionConfig::from_json_str(r#"{ "seed": 7, "day": { "day_length_seconds": 60.0 } }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.day.day_length_seconds, 60.0);
        assert_eq!(config.day.phase_offset_seconds, 30.0);
        assert_eq!(config.arena.tree_count, 30);
    }

    #[test]
    fn rejects_bad_probability() {
        let err = SessionConfig::from_json_str(r#"{ "spawn": { "drop_chance": 1.5 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_spawn_spread() {
        let err = SessionConfig::from_json_str(
            r#"{ "arena": { "spawn_spread": 0.0 }, "spawn": { "hostile_chance": 1.0 } }"#,
        );
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let mut config = SessionConfig::default();
        config.arena.spawn_spread = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_negative_tree_extent() {
        let err = SessionConfig::from_json_str(r#"{ "arena": { "tree_extent": -1.0 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let mut config = SessionConfig::default();
        config.arena.tree_extent = f32::INFINITY;
        assert!(config.validate().is_err());
        config.arena.tree_extent = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_day_length() {
        let mut config = SessionConfig::default();
        config.day.day_length_seconds = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_initial_health_above_max() {
        let mut config = SessionConfig::default();
        config.player.initial_health = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let config = SessionConfig::with_seed(99);
        config.save_json(tmp.path()).unwrap();
        let loaded = SessionConfig::from_json_file(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
