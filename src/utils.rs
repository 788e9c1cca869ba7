//! Utilities for peek: CLI parsing and small path helpers.

pub mod cli;
pub mod helpers;
