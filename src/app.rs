//! Application layer: controller state, input decoding, and navigation
//! logic tying the core directory model to the terminal UI.

pub mod handlers;
pub mod keymap;
pub mod nav;
pub mod search;
pub mod state;

pub use keymap::{Direction, InputEvent};
pub use state::{AppState, Flow, Mode, Prompt};
