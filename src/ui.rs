//! Terminal output: the in-place renderer and the one-shot listing
//! printer.

pub mod render;

pub use render::{Renderer, print_listing};
