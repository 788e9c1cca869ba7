//! External process launching for peek.
//!
//! The engine hands the selected entry to an external program (opener,
//! editor, the entry itself, or a nested shell) and blocks until it
//! terminates. The terminal is handed over in cooked mode for the child's
//! lifetime and reclaimed afterwards.
//!
//! Children can tell they run inside peek: `PEEK_LEVEL` carries the
//! nesting depth (incremented when already set, like `SHLVL`), and
//! `PEEK_SELECTION` carries the currently selected entry name so external
//! scripts can query it.

use crate::core::errors::LaunchError;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Nesting-depth environment variable, `SHLVL`-style.
pub const ENV_LEVEL: &str = "PEEK_LEVEL";
/// Name of the selected entry, exported to children.
pub const ENV_SELECTION: &str = "PEEK_SELECTION";

/// Platform opener used for the "open" action.
pub fn default_opener() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("open")
    } else if cfg!(target_os = "windows") {
        Some("cygstart")
    } else if cfg!(unix) {
        Some("xdg-open")
    } else {
        None
    }
}

/// Editor for the "edit" action: configured command, then `$EDITOR`,
/// then vim.
pub fn default_editor(configured: Option<&str>) -> String {
    configured
        .map(str::to_owned)
        .or_else(|| env::var("EDITOR").ok().filter(|e| !e.is_empty()))
        .unwrap_or_else(|| "vim".to_string())
}

/// Shell for the nested-shell action: `$SHELL`, then sh.
pub fn default_shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "sh".to_string())
}

/// The nesting depth to export: one more than the inherited depth.
pub fn nesting_level() -> u32 {
    env::var(ENV_LEVEL)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .map(|n| n.saturating_add(1))
        .unwrap_or(1)
}

/// Runs `program` (optionally with the selected entry as its argument) in
/// `cwd`, blocking until it exits.
///
/// Raw mode is suspended for the child's lifetime and restored before
/// returning, on success and on failure alike. A program that cannot be
/// found is reported without ever leaving cooked mode to a half-started
/// child.
pub fn launch(
    program: &OsStr,
    arg: Option<&OsStr>,
    cwd: &Path,
    selection: Option<&OsStr>,
) -> Result<ExitStatus, LaunchError> {
    // Bare names go through PATH; catch a missing program before the
    // terminal is handed over.
    let bare = !program.to_string_lossy().contains(std::path::MAIN_SEPARATOR);
    if bare && which::which(program).is_err() {
        return Err(LaunchError::NotFound(program.to_string_lossy().into_owned()));
    }

    let mut cmd = Command::new(program);
    cmd.current_dir(cwd);
    if let Some(arg) = arg {
        cmd.arg(arg);
    }
    cmd.env(ENV_LEVEL, nesting_level().to_string());
    if let Some(sel) = selection {
        cmd.env(ENV_SELECTION, sel);
    }

    suspend_terminal();
    let status = cmd.status();
    resume_terminal();

    status.map_err(|e| LaunchError::Spawn(program.to_string_lossy().into_owned(), e))
}

/// Hands the terminal to the child: cooked mode, visible cursor.
fn suspend_terminal() {
    let _ = execute!(io::stdout(), Show);
    let _ = disable_raw_mode();
}

/// Takes the terminal back. The child may have left any state behind;
/// the caller marks the display dirty so the next draw is a full one.
fn resume_terminal() {
    let _ = enable_raw_mode();
    let _ = execute!(io::stdout(), Hide);
}
