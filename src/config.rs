//! Configuration for peek.
//!
//! Settings come from two places, lowest precedence first: the optional
//! `peek.toml` file ([load::Config]) and the command-line flags parsed in
//! [crate::utils::cli]. The merged result is an [Options] value threaded
//! through the app.

pub mod general;
pub mod load;

pub use general::{General, Options, Programs};
pub use load::Config;
