//! Column layout for the entry grid.
//!
//! A [Layout] is a pure function of the entry widths, the terminal size
//! and the selection; it is recomputed only when one of those changed and
//! replaced atomically, never patched in place.
//!
//! Entries are assigned to columns round-robin by index (`column = i mod
//! k`). Feasibility of a column count is monotonic in practice (more
//! columns need at least as much total width), which is what makes the
//! binary search below valid; a pathological width distribution could in
//! principle break that, in which case the search still returns a feasible,
//! if not maximal, count.

use crate::core::fm::Entry;
use crate::core::formatter::DELIM_WIDTH;

/// How entries are arranged on screen.
///
/// `formatted == false` means everything fits on one unbroken line and no
/// column math applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    formatted: bool,
    columns: usize,
    col_widths: Vec<usize>,
    col_offsets: Vec<usize>,
    rows: usize,
    window: (usize, usize),
}

impl Layout {
    /// The layout of nothing: what the renderer sees before the first
    /// computation or for an empty directory.
    pub fn empty() -> Self {
        Layout {
            formatted: false,
            columns: 0,
            col_widths: Vec::new(),
            col_offsets: Vec::new(),
            rows: 0,
            window: (0, 0),
        }
    }

    // Accessors

    #[inline]
    pub fn formatted(&self) -> bool {
        self.formatted
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Inclusive `(offset, limit)` of the visible pagination window.
    #[inline]
    pub fn window(&self) -> (usize, usize) {
        self.window
    }

    /// Whether `index` falls inside the visible window.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.window.0 && index <= self.window.1
    }

    /// Width allotted to the column `index` lands in (name + indicator,
    /// excluding the delimiter). Only meaningful when formatted.
    pub fn cell_width(&self, index: usize) -> usize {
        if self.col_widths.is_empty() {
            return 0;
        }
        self.col_widths[index % self.columns]
    }

    /// 1-based terminal column where the layout column of `index` starts.
    pub fn cell_offset(&self, index: usize) -> usize {
        if self.col_offsets.is_empty() {
            return 1;
        }
        self.col_offsets[index % self.columns]
    }

    /// Effective width of one entry as laid out: measured name width plus
    /// one cell for the indicator glyph when indicators are enabled.
    pub fn effective_width(entry: &Entry, indicate: bool) -> usize {
        let ind = if indicate && entry.class().indicator().is_some() {
            1
        } else {
            0
        };
        entry.width() + ind
    }

    /// Computes the layout for `entries` on a `term_cols` wide terminal
    /// with `usable_rows` rows available below the header.
    ///
    /// `selected` drives the pagination window; pages are aligned to
    /// multiples of the page size, so the cursor is always on the rendered
    /// page.
    pub fn compute(
        entries: &[Entry],
        indicate: bool,
        term_cols: usize,
        usable_rows: usize,
        selected: usize,
    ) -> Self {
        let n = entries.len();
        if n == 0 {
            return Layout::empty();
        }

        let widths: Vec<usize> = entries
            .iter()
            .map(|e| Self::effective_width(e, indicate))
            .collect();

        // Single-line shortcut: everything fits on one row. No delimiter
        // follows the last entry, so the sum excludes one.
        let total = widths.iter().sum::<usize>() + (n - 1) * DELIM_WIDTH;
        if total <= term_cols {
            return Layout {
                formatted: false,
                columns: n,
                col_widths: Vec::new(),
                col_offsets: Vec::new(),
                rows: 1,
                window: (0, n - 1),
            };
        }

        let columns = Self::max_columns(&widths, term_cols);
        let rows = n.div_ceil(columns);

        let mut col_widths = vec![0usize; columns];
        for (i, w) in widths.iter().enumerate() {
            let c = i % columns;
            if *w > col_widths[c] {
                col_widths[c] = *w;
            }
        }
        // Even a lone oversized entry may not exceed the terminal; the
        // renderer truncates whatever sticks out of its column.
        let col_cap = term_cols.saturating_sub(DELIM_WIDTH + 1).max(1);
        for w in &mut col_widths {
            *w = (*w).min(col_cap);
        }

        let mut col_offsets = Vec::with_capacity(columns);
        let mut x = 1; // terminal columns are 1-based
        for w in &col_widths {
            col_offsets.push(x);
            x += w + DELIM_WIDTH;
        }

        let window = if rows > usable_rows && usable_rows > 0 {
            let page = usable_rows * columns;
            let offset = selected / page * page;
            (offset, (offset + page - 1).min(n - 1))
        } else {
            (0, n - 1)
        };

        Layout {
            formatted: true,
            columns,
            col_widths,
            col_offsets,
            rows,
            window,
        }
    }

    /// Whether `k` columns fit: the per-column maxima of a round-robin
    /// assignment, each plus the delimiter, must not exceed the terminal.
    pub fn fits(widths: &[usize], k: usize, term_cols: usize) -> bool {
        if k == 0 || k > widths.len() {
            return false;
        }
        let mut maxima = vec![0usize; k];
        for (i, w) in widths.iter().enumerate() {
            let c = i % k;
            if *w > maxima[c] {
                maxima[c] = *w;
            }
        }
        maxima.iter().map(|m| m + DELIM_WIDTH).sum::<usize>() <= term_cols
    }

    /// Largest feasible column count, by binary search over `[1, n]`.
    /// When not even one column fits, 1 is returned and the renderer
    /// truncates.
    fn max_columns(widths: &[usize], term_cols: usize) -> usize {
        let n = widths.len();
        let (mut lo, mut hi) = (1, n);
        let mut best = 1;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            if Self::fits(widths, mid, term_cols) {
                best = mid;
                lo = mid + 1;
            } else {
                hi = mid - 1;
            }
        }
        best
    }
}
