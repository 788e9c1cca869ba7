//! Core engine pieces for peek.
//!
//! This module contains the non-interactive "engine" parts of the browser:
//! - [fm]: directory scanning, entry classification and navigation state
//!   (see [scan], [Entry], [DirState]).
//! - [formatter]: display-width measurement and name sanitizing shared by
//!   the layout engine and the renderer.
//! - [layout]: the pure column-layout computation (see [Layout]).
//! - [terminal]: raw-mode lifecycle, the cursor-position query protocol
//!   and the main event loop.
//! - [proc]: launching external programs against the selected entry.
//! - [errors]: the recoverable error taxonomy.

pub mod errors;
pub mod fm;
pub mod formatter;
pub mod layout;
pub mod proc;
pub mod terminal;

pub use errors::{LaunchError, NavigationError, ScanError};
pub use fm::{DirState, Entry, EntryClass, ScanOptions, scan};
pub use layout::Layout;
pub use terminal::{TermPos, TerminalSession};
