//! Loading and deserializing `peek.toml`.
//!
//! The configuration only supplies defaults; command-line flags always win
//! over it. A missing file is not an error, and a malformed one falls back
//! to the built-in defaults with a note on stderr (printed before the
//! terminal is taken over).

use crate::config::{General, Programs};

use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs};

/// Environment variable overriding the config file location.
pub const ENV_CONFIG: &str = "PEEK_CONFIG";

/// Raw shape of `peek.toml`.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawConfig {
    general: General,
    programs: Programs,
}

/// Processed configuration as used by the rest of peek.
#[derive(Debug, Default)]
pub struct Config {
    general: General,
    programs: Programs,
}

impl Config {
    /// `$PEEK_CONFIG`, or `<config dir>/peek/peek.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(ENV_CONFIG) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("peek").join("peek.toml"))
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// absent or malformed.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parses a config document; malformed input falls back to defaults.
    pub fn parse(content: &str) -> Self {
        match toml::from_str::<RawConfig>(content) {
            Ok(raw) => Config {
                general: raw.general,
                programs: raw.programs,
            },
            Err(e) => {
                eprintln!("Error parsing peek.toml: {}", e);
                Self::default()
            }
        }
    }

    // Getters

    #[inline]
    pub fn general(&self) -> &General {
        &self.general
    }

    #[inline]
    pub fn programs(&self) -> &Programs {
        &self.programs
    }
}
