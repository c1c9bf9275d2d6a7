//! Gamepad support
//!
//! Native: Uses gilrs crate for cross-platform gamepad input
//! WASM: No gamepad; keyboard only

use super::controller::ControllerButton;

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod platform {
    use super::*;

    #[derive(Default)]
    pub struct Gamepad;

    impl Gamepad {
        pub fn new() -> Self {
            Self
        }

        pub fn poll(&mut self) {}

        pub fn has_gamepad(&self) -> bool {
            false
        }

        pub fn is_button_down(&self, _button: ControllerButton) -> bool {
            false
        }
    }
}

// ============================================================================
// Native Implementation (gilrs)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    use super::*;
    use gilrs::{Axis, Button as GilrsButton, Gilrs};
    use tracing::warn;

    pub struct Gamepad {
        gilrs: Option<Gilrs>,
        deadzone: f32,
    }

    impl Gamepad {
        pub fn new() -> Self {
            let gilrs = match Gilrs::new() {
                Ok(gilrs) => Some(gilrs),
                Err(e) => {
                    warn!("gamepad support unavailable: {}", e);
                    None
                }
            };
            Self { gilrs, deadzone: 0.3 }
        }

        pub fn poll(&mut self) {
            let Some(gilrs) = self.gilrs.as_mut() else { return };
            // Events are processed internally by gilrs
            while gilrs.next_event().is_some() {}
        }

        pub fn has_gamepad(&self) -> bool {
            self.active().is_some()
        }

        fn active(&self) -> Option<gilrs::Gamepad<'_>> {
            self.gilrs.as_ref()?.gamepads().next().map(|(_, gp)| gp)
        }

        pub fn is_button_down(&self, button: ControllerButton) -> bool {
            let Some(gp) = self.active() else { return false };
            let x = gp.value(Axis::LeftStickX);
            let y = gp.value(Axis::LeftStickY);
            match button {
                ControllerButton::Left => gp.is_pressed(GilrsButton::DPadLeft) || x < -self.deadzone,
                ControllerButton::Right => gp.is_pressed(GilrsButton::DPadRight) || x > self.deadzone,
                ControllerButton::Up => gp.is_pressed(GilrsButton::DPadUp) || y > self.deadzone,
                ControllerButton::Down => gp.is_pressed(GilrsButton::DPadDown) || y < -self.deadzone,
                ControllerButton::A => gp.is_pressed(GilrsButton::South),
                ControllerButton::B => gp.is_pressed(GilrsButton::West) || gp.is_pressed(GilrsButton::East),
                ControllerButton::Start => gp.is_pressed(GilrsButton::Start),
                ControllerButton::Select => gp.is_pressed(GilrsButton::Select),
            }
        }
    }

    impl Default for Gamepad {
        fn default() -> Self {
            Self::new()
        }
    }
}

pub use platform::Gamepad;
