//! Input handling with gamepad support
//!
//! Keyboard and gamepad are folded into a single NES-style controller.
//!
//! Native: Uses gilrs crate for cross-platform gamepad input
//! WASM: Keyboard only

mod controller;
mod gamepad;
mod state;

pub use controller::{ControllerButton, ControllerState};
pub use gamepad::Gamepad;
pub use state::InputState;
