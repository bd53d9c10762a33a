//! Keyboard input.
//!
//! The public API does not expose winit types; the runtime translates window
//! events into [`InputEvent`]s and feeds them to [`InputState`].

mod state;
mod types;

pub(crate) mod platform {
    pub(crate) mod winit;
}

pub use state::InputState;
pub use types::{InputEvent, Key, KeyState};
