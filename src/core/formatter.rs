//! Display-width measurement and name sanitizing for peek.
//!
//! Everything the renderer prints for an entry name goes through this
//! module, so the width bookkeeping used by the layout engine and the text
//! that actually lands on screen can never disagree.
//!
//! Control characters are dropped from output by default. With the hex
//! mode enabled (`-x`), each control byte is printed as a `\XX` escape and
//! counts for three cells.

use unicode_width::UnicodeWidthChar;

/// Printed between entries, both in single-line and column mode.
pub const ENTRY_DELIM: &str = "  ";
/// Display width of [ENTRY_DELIM].
pub const DELIM_WIDTH: usize = 2;
/// Marks a name that was cut to fit its column.
pub const TRUNCATION_MARKER: char = '~';

/// Display width of a single character under the current hex setting.
///
/// Printable characters report their unicode width (0, 1 or 2). Control
/// characters report 0, or the width of their escape rendering (`\XX` per
/// underlying byte) when `print_hex` is set.
#[inline]
pub fn char_width(c: char, print_hex: bool) -> usize {
    if c.is_control() {
        if print_hex { 3 * c.len_utf8() } else { 0 }
    } else {
        c.width().unwrap_or(0)
    }
}

/// Display width of a whole name under the current hex setting.
pub fn measure(name: &str, print_hex: bool) -> usize {
    name.chars().map(|c| char_width(c, print_hex)).sum()
}

/// The exact text printed for a name: printable characters verbatim,
/// control characters dropped or hex-escaped.
///
/// The displayed width of the result always equals [measure] of the input.
pub fn sanitize(name: &str, print_hex: bool) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_control() {
            if print_hex {
                let mut bytes = [0u8; 4];
                for b in c.encode_utf8(&mut bytes).as_bytes() {
                    out.push_str(&format!("\\{:02X}", b));
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Cuts a sanitized name down to at most `budget` cells without splitting
/// a codepoint. A character that would straddle the edge is dropped whole.
///
/// Returns the kept prefix and its display width.
pub fn truncate_to(sanitized: &str, budget: usize) -> (&str, usize) {
    let mut used = 0;
    let mut end = 0;
    for (i, c) in sanitized.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = i + c.len_utf8();
    }
    (&sanitized[..end], used)
}
