//! Selection movement over the entry grid.
//!
//! All movement is a pure function of the current index, the entry count
//! and the layout; it can never produce an out-of-range index. In column
//! mode, Up/Down stay in their column and wrap across the top/bottom
//! edge, Left/Right step across columns and wrap within the row. On a
//! single unformatted line Left/Right degrade to simple wraparound and
//! Up/Down do nothing.

use crate::app::keymap::Direction;
use crate::core::layout::Layout;

/// The index the cursor moves to for one keypress.
pub fn step(dir: Direction, selected: usize, count: usize, layout: &Layout) -> usize {
    if count == 0 {
        return 0;
    }
    let selected = selected.min(count - 1);

    if layout.formatted() && layout.columns() > 0 {
        step_grid(dir, selected, count, layout.columns())
    } else {
        step_line(dir, selected, count)
    }
}

fn step_grid(dir: Direction, selected: usize, count: usize, k: usize) -> usize {
    match dir {
        Direction::Up => {
            if selected >= k {
                selected - k
            } else {
                // Top edge: wrap to the last occupied row of this column.
                let col = selected;
                let last_row = (count - 1 - col) / k;
                col + last_row * k
            }
        }
        Direction::Down => {
            if selected + k < count {
                selected + k
            } else {
                // Bottom edge: wrap to the first row of this column.
                selected % k
            }
        }
        Direction::Left => {
            if selected % k == 0 {
                (selected + k - 1).min(count - 1)
            } else {
                selected - 1
            }
        }
        Direction::Right => {
            if selected == count - 1 {
                selected - selected % k
            } else if selected % k == k - 1 {
                selected - (k - 1)
            } else {
                selected + 1
            }
        }
    }
}

fn step_line(dir: Direction, selected: usize, count: usize) -> usize {
    match dir {
        Direction::Left => (selected + count - 1) % count,
        Direction::Right => (selected + 1) % count,
        // No row above or below on a single line.
        Direction::Up | Direction::Down => selected,
    }
}
