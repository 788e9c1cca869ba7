//! Internal library crate for peek.
//!
//! The shipped application is the `pk` binary (`src/main.rs`).
//!
//! This library exists to share code between targets (binary, tests) and to keep modules organized.
//! This API is only used to build the `pk` binary and is not considered a library for external use.

pub mod app;
pub mod config;
pub mod core;
pub mod ui;
pub mod utils;
