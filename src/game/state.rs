//! Persistent game progress
//!
//! Defeated levels, collected tanks, currency and lives. Every change queues
//! an event (`AddCurrency`, `AttainHeartTank`, ...) which the runtime
//! forwards to the `EventsManager`, so the HUD and the player pick it up
//! without holding a reference to the state.
//!
//! Saved as RON in the platform data directory.

use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use crate::config::EngineConfig;
use super::event::{Event, EventQueue, EventType};
use super::points::Points;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt save file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize save: {0}")]
    Serialize(#[from] ron::Error),
}

/// Heart tanks raise max health. One hidden per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeartTank {
    A, B, C, D, E, F, G, H,
}

/// Health tanks store health for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthTank {
    A, B, C, D,
}

/// Health added to the max per heart tank
pub const HEART_TANK_HEALTH: i32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    defeated_levels: BTreeSet<String>,
    heart_tanks: BTreeSet<HeartTank>,
    health_tanks: BTreeSet<HealthTank>,
    currency: Points,
    lives: Points,
    #[serde(skip)]
    changes: EventQueue<Event>,
}

impl GameState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            defeated_levels: BTreeSet::new(),
            heart_tanks: BTreeSet::new(),
            health_tanks: BTreeSet::new(),
            currency: Points::new(0, config.max_currency, 0),
            lives: Points::new(0, config.max_lives, config.start_lives),
            changes: EventQueue::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Levels
    // -------------------------------------------------------------------------

    pub fn is_level_defeated(&self, level: &str) -> bool {
        self.defeated_levels.contains(level)
    }

    /// Returns false if it was already defeated.
    pub fn add_defeated_level(&mut self, level: &str) -> bool {
        let added = self.defeated_levels.insert(level.to_string());
        if added {
            info!(level, "level defeated");
        }
        added
    }

    pub fn defeated_levels(&self) -> impl Iterator<Item = &str> {
        self.defeated_levels.iter().map(String::as_str)
    }

    // -------------------------------------------------------------------------
    // Tanks
    // -------------------------------------------------------------------------

    pub fn has_heart_tank(&self, tank: HeartTank) -> bool {
        self.heart_tanks.contains(&tank)
    }

    pub fn add_heart_tank(&mut self, tank: HeartTank) -> bool {
        if !self.heart_tanks.insert(tank) {
            return false;
        }
        self.changes.send(Event::new(EventType::AttainHeartTank).with("tank", format!("{:?}", tank)));
        true
    }

    pub fn heart_tank_count(&self) -> usize {
        self.heart_tanks.len()
    }

    /// Max health with every collected heart tank applied
    pub fn max_health(&self, base: i32) -> i32 {
        base + self.heart_tanks.len() as i32 * HEART_TANK_HEALTH
    }

    pub fn has_health_tank(&self, tank: HealthTank) -> bool {
        self.health_tanks.contains(&tank)
    }

    pub fn add_health_tank(&mut self, tank: HealthTank) -> bool {
        if !self.health_tanks.insert(tank) {
            return false;
        }
        self.changes.send(Event::new(EventType::AttainHealthTank).with("tank", format!("{:?}", tank)));
        true
    }

    // -------------------------------------------------------------------------
    // Currency and lives
    // -------------------------------------------------------------------------

    pub fn currency(&self) -> i32 {
        self.currency.current()
    }

    /// Add (or spend, if negative) currency. Returns the change actually applied.
    pub fn add_currency(&mut self, amount: i32) -> i32 {
        let applied = self.currency.translate(amount);
        if applied != 0 {
            self.changes.send(Event::new(EventType::AddCurrency).with("amount", applied));
        }
        applied
    }

    pub fn lives(&self) -> i32 {
        self.lives.current()
    }

    pub fn add_life(&mut self) -> bool {
        self.lives.translate(1) != 0
    }

    /// Spend a life. False once the last one is gone.
    pub fn lose_life(&mut self) -> bool {
        self.lives.translate(-1);
        !self.is_at_min_lives()
    }

    pub fn is_at_min_lives(&self) -> bool {
        self.lives.is_min()
    }

    pub fn reset_lives(&mut self, config: &EngineConfig) {
        self.lives.set(config.start_lives);
    }

    /// Events produced since the last drain.
    pub fn drain_changes(&mut self) -> Vec<Event> {
        self.changes.drain().collect()
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        info!("game saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SaveError> {
        let text = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }
}

/// Default save location in the platform data directory.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_save_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maverick")
        .join("save.ron")
}

#[cfg(target_arch = "wasm32")]
pub fn default_save_path() -> PathBuf {
    PathBuf::from("save.ron")
}
