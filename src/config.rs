//! Engine configuration
//!
//! Every tunable lives here with the game's stock values as defaults. A RON
//! file may override any subset of fields.

use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;
use crate::game::physics::PhysicsConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Visible area in world units (tiles)
    pub view_width: f32,
    pub view_height: f32,
    /// Pixels per world unit
    pub ppm: f32,
    /// Physics step in seconds
    pub fixed_time_step: f32,
    /// Longest frame the loop will try to catch up on
    pub max_frame_time: f32,
    pub physics: PhysicsConfig,

    pub max_health: i32,
    pub max_weapon_ammo: i32,
    pub start_lives: i32,
    pub max_lives: i32,
    pub max_currency: i32,

    pub room_trans_delay: f32,
    pub room_trans_duration: f32,
    /// How far into the next room the player is carried during a transition
    pub room_trans_distance: f32,
    pub player_death_delay: f32,

    /// A* search bound for flying enemies
    pub pathfinding_max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            view_width: 16.0,
            view_height: 14.0,
            ppm: 32.0,
            fixed_time_step: 1.0 / 150.0,
            max_frame_time: 0.25,
            physics: PhysicsConfig::default(),
            max_health: 30,
            max_weapon_ammo: 30,
            start_lives: 3,
            max_lives: 9,
            max_currency: 999,
            room_trans_delay: 0.35,
            room_trans_duration: 1.0,
            room_trans_distance: 1.5,
            player_death_delay: 3.0,
            pathfinding_max_iterations: 100,
        }
    }
}

impl EngineConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&text)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_game() {
        let config = EngineConfig::default();
        assert_eq!(config.view_width, 16.0);
        assert_eq!(config.view_height, 14.0);
        assert_eq!(config.ppm, 32.0);
        assert!((config.fixed_time_step - 1.0 / 150.0).abs() < 1e-9);
        assert_eq!(config.max_health, 30);
        assert_eq!(config.start_lives, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_ron("(max_health: 20, room_trans_duration: 0.5)").unwrap();
        assert_eq!(config.max_health, 20);
        assert_eq!(config.room_trans_duration, 0.5);
        assert_eq!(config.ppm, 32.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let mut config = EngineConfig::default();
        config.start_lives = 5;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let err = EngineConfig::from_ron("(max_health: \"lots\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
