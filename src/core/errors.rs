//! Recoverable error taxonomy for peek.
//!
//! Everything here ends up as transient status-line text; none of these
//! abort the session. Fatal conditions (a start directory that cannot be
//! opened, a lost terminal) surface as plain `io::Error` through `main`.

use std::io;
use thiserror::Error;

/// The current directory could not be listed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not scan: {0}")]
    Unreadable(#[from] io::Error),
}

/// A directory change failed; the previous state is kept.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The target resolved but cannot be entered or read.
    #[error("{0}")]
    Chdir(io::Error),
    /// The target path does not resolve at all.
    #[error("{0}")]
    Resolve(io::Error),
}

/// An external program could not be handed the terminal.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{0}: not found")]
    NotFound(String),
    #[error("failed to start {0}: {1}")]
    Spawn(String, io::Error),
}
