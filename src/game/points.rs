//! Bounded integer counters: health, weapon ammo, lives, currency.

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    min: i32,
    max: i32,
    current: i32,
}

impl Points {
    /// `current` is clamped into `min..=max`. A `max` below `min` is raised to `min`.
    pub fn new(min: i32, max: i32, current: i32) -> Self {
        let max = max.max(min);
        Self { min, max, current: current.clamp(min, max) }
    }

    /// Starts full.
    pub fn full(min: i32, max: i32) -> Self {
        Self::new(min, max, max)
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn set(&mut self, value: i32) {
        self.current = value.clamp(self.min, self.max);
    }

    /// Add `delta` (may be negative). Returns the change actually applied.
    pub fn translate(&mut self, delta: i32) -> i32 {
        let before = self.current;
        self.set(before.saturating_add(delta));
        self.current - before
    }

    pub fn set_to_max(&mut self) {
        self.current = self.max;
    }

    pub fn set_to_min(&mut self) {
        self.current = self.min;
    }

    pub fn set_max(&mut self, max: i32) {
        self.max = max.max(self.min);
        self.current = self.current.min(self.max);
    }

    pub fn is_max(&self) -> bool {
        self.current == self.max
    }

    pub fn is_min(&self) -> bool {
        self.current == self.min
    }

    /// Fill level in 0..=1.
    pub fn ratio(&self) -> f32 {
        let range = self.max - self.min;
        if range == 0 {
            1.0
        } else {
            (self.current - self.min) as f32 / range as f32
        }
    }
}
