//! Input state management
//!
//! Polls both keyboard (macroquad) and gamepad (gilrs) input and folds them
//! into one `ControllerState` per frame.

use macroquad::prelude::{is_key_down, KeyCode};
use super::controller::{ControllerButton, ControllerState};
use super::gamepad::Gamepad;

pub struct InputState {
    gamepad: Gamepad,
}

impl InputState {
    pub fn new() -> Self {
        Self { gamepad: Gamepad::new() }
    }

    /// Call once per frame before the simulation reads the controller.
    pub fn poll(&mut self, controller: &mut ControllerState) {
        self.gamepad.poll();
        let gamepad = &self.gamepad;
        controller.update(|button| keyboard_down(button) || gamepad.is_button_down(button));
    }

    pub fn has_gamepad(&self) -> bool {
        self.gamepad.has_gamepad()
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

fn keyboard_down(button: ControllerButton) -> bool {
    match button {
        ControllerButton::Left => is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
        ControllerButton::Right => is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
        ControllerButton::Up => is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
        ControllerButton::Down => is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
        ControllerButton::A => is_key_down(KeyCode::Space) || is_key_down(KeyCode::K),
        ControllerButton::B => is_key_down(KeyCode::J) || is_key_down(KeyCode::X),
        ControllerButton::Start => is_key_down(KeyCode::Enter) || is_key_down(KeyCode::Escape),
        ControllerButton::Select => is_key_down(KeyCode::Tab),
    }
}
