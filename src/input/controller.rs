//! NES-style controller state.
//!
//! Game code only sees `ControllerState`; it never touches the keyboard or
//! gamepad directly. That keeps the simulation testable without a window.

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerButton {
    Left,
    Right,
    Up,
    Down,
    /// Jump
    A,
    /// Shoot
    B,
    Start,
    Select,
}

impl ControllerButton {
    pub const ALL: [ControllerButton; 8] = [
        ControllerButton::Left,
        ControllerButton::Right,
        ControllerButton::Up,
        ControllerButton::Down,
        ControllerButton::A,
        ControllerButton::B,
        ControllerButton::Start,
        ControllerButton::Select,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Held / just-pressed / just-released state of every button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    current: u8,
    previous: u8,
    enabled: bool,
}

impl ControllerState {
    pub fn new() -> Self {
        Self { current: 0, previous: 0, enabled: true }
    }

    /// Feed this frame's raw button states.
    pub fn update(&mut self, is_down: impl Fn(ControllerButton) -> bool) {
        self.previous = self.current;
        self.current = ControllerButton::ALL
            .iter()
            .filter(|&&b| is_down(b))
            .fold(0, |mask, &b| mask | b.bit());
    }

    /// Set explicit states (tests, headless runs).
    pub fn set_buttons(&mut self, buttons: &[ControllerButton]) {
        self.update(|b| buttons.contains(&b));
    }

    /// A disabled controller reads as nothing pressed.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_pressed(&self, button: ControllerButton) -> bool {
        self.enabled && self.current & button.bit() != 0
    }

    pub fn is_just_pressed(&self, button: ControllerButton) -> bool {
        self.enabled && self.current & button.bit() != 0 && self.previous & button.bit() == 0
    }

    pub fn is_just_released(&self, button: ControllerButton) -> bool {
        self.enabled && self.current & button.bit() == 0 && self.previous & button.bit() != 0
    }

    /// -1, 0 or 1 from Left/Right
    pub fn horizontal(&self) -> f32 {
        match (self.is_pressed(ControllerButton::Left), self.is_pressed(ControllerButton::Right)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}
