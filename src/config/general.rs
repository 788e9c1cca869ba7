//! General settings for peek.
//!
//! [General] is the `[general]` table of `peek.toml`; [Options] is the
//! merged runtime view after command-line flags have been applied on top.

use crate::core::fm::ScanOptions;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct General {
    show_hidden: bool,
    color: bool,
    clear_on_exit: bool,
    show_path: bool,
    indicators: bool,
    print_hex: bool,
}

impl Default for General {
    fn default() -> Self {
        General {
            show_hidden: false,
            color: true,
            clear_on_exit: false,
            show_path: true,
            indicators: false,
            print_hex: false,
        }
    }
}

/// The `[programs]` table: overrides for the opener and editor commands.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Programs {
    editor: Option<String>,
    opener: Option<String>,
}

impl Programs {
    #[inline]
    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref()
    }

    #[inline]
    pub fn opener(&self) -> Option<&str> {
        self.opener.as_deref()
    }
}

/// Effective display/behavior options for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub show_hidden: bool,
    pub color: bool,
    pub clear_on_exit: bool,
    pub show_path: bool,
    pub indicators: bool,
    pub print_hex: bool,
}

impl Options {
    /// The subset that influences scanning.
    pub fn scan(&self) -> ScanOptions {
        ScanOptions {
            show_hidden: self.show_hidden,
            print_hex: self.print_hex,
        }
    }
}

impl From<&General> for Options {
    fn from(g: &General) -> Self {
        Options {
            show_hidden: g.show_hidden,
            color: g.color,
            clear_on_exit: g.clear_on_exit,
            show_path: g.show_path,
            indicators: g.indicators,
            print_hex: g.print_hex,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::from(&General::default())
    }
}
