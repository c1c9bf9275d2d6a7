//! Countdown timer used everywhere gameplay waits on time:
//! weapon cooldowns, damage/recovery windows, room transitions, AI phases.

/// A timer that counts up to `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    duration: f32,
    elapsed: f32,
    just_finished: bool,
}

impl Timer {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
            just_finished: false,
        }
    }

    /// A timer that starts out already finished.
    pub fn finished(duration: f32) -> Self {
        let mut timer = Self::new(duration);
        timer.set_to_end();
        timer
    }

    /// Advance the timer. `is_just_finished` is true only for the update
    /// that crosses the end.
    pub fn update(&mut self, delta: f32) {
        let was_finished = self.is_finished();
        self.elapsed = (self.elapsed + delta).min(self.duration);
        self.just_finished = !was_finished && self.is_finished();
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.just_finished = false;
    }

    pub fn set_to_end(&mut self) {
        self.elapsed = self.duration;
        self.just_finished = false;
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
        self.elapsed = self.elapsed.min(self.duration);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn is_just_finished(&self) -> bool {
        self.just_finished
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Progress in 0..=1. A zero-length timer reports 1.
    pub fn ratio(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_finished_fires_once() {
        let mut timer = Timer::new(1.0);
        timer.update(0.6);
        assert!(!timer.is_finished());
        timer.update(0.6);
        assert!(timer.is_finished());
        assert!(timer.is_just_finished());
        timer.update(0.1);
        assert!(timer.is_finished());
        assert!(!timer.is_just_finished());
    }

    #[test]
    fn test_finished_constructor_and_reset() {
        let mut timer = Timer::finished(0.5);
        assert!(timer.is_finished());
        assert_eq!(timer.ratio(), 1.0);
        timer.reset();
        assert!(!timer.is_finished());
        assert_eq!(timer.ratio(), 0.0);
    }

    #[test]
    fn test_zero_duration() {
        let timer = Timer::new(0.0);
        assert!(timer.is_finished());
        assert_eq!(timer.ratio(), 1.0);
    }
}
