//! Incremental prefix search over the current entry list.
//!
//! While searching, every keystroke extends or shrinks the query and the
//! selection jumps to the first entry whose name starts with it,
//! case-sensitively. No match leaves the selection where it is.

use crate::core::fm::Entry;

/// Index of the first entry whose name has `query` as a prefix.
pub fn prefix_match(entries: &[Entry], query: &str) -> Option<usize> {
    if query.is_empty() {
        return None;
    }
    entries
        .iter()
        .position(|e| e.name_str().starts_with(query))
}
