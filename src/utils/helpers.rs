//! Helpers for peek.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Expands a leading `~` in a user-supplied path to the home directory.
///
/// Shells normally expand `~` before peek sees it, but a quoted argument
/// or a config-file value arrives verbatim.
pub fn expand_home_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~')
        && (rest.is_empty() || rest.starts_with(MAIN_SEPARATOR))
        && let Some(home) = dirs::home_dir()
    {
        if rest.is_empty() {
            return home;
        }
        return home.join(rest.trim_start_matches(MAIN_SEPARATOR));
    }
    Path::new(path).to_path_buf()
}
