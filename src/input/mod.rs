//! Input handling module
//!
//! Tracks keyboard, mouse button, pointer and wheel state fed from window
//! events, exposed read-only to components for the duration of a tick.

mod state;

pub use state::Input;
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
