//! In-place rendering for peek.
//!
//! peek draws into the terminal's normal buffer, starting wherever the
//! shell prompt left the cursor. The renderer therefore has no absolute
//! home position: it anchors everything to the status line, whose row it
//! recovers from the terminal with cursor-position queries after each full
//! draw (printing near the bottom of the screen scrolls the buffer and
//! shifts every previously known row).
//!
//! Two draw paths exist. A full redraw erases the old listing and reprints
//! everything, caching each visible entry's screen position. Moving the
//! cursor within the current page takes the incremental path instead,
//! which repaints exactly two cells from that cache. Both paths go through
//! [`draw_cell`], so a cell looks the same no matter which path produced
//! it.

use crate::app::state::{AppState, Prompt};
use crate::config::Options;
use crate::core::fm::DirState;
use crate::core::formatter::{self, DELIM_WIDTH, ENTRY_DELIM, TRUNCATION_MARKER};
use crate::core::layout::Layout;
use crate::core::terminal::TerminalSession;

use crossterm::style::Color;

use std::io::{self, Read, Write};

/// Rows the header/status line occupies above the listing.
const HEADER_ROWS: u16 = 1;

/// Shown in place of a listing when the directory cannot be read.
const MSG_CANT_SCAN: &str = "could not scan";
/// Shown in place of a listing when the directory has no visible entries.
const MSG_EMPTY: &str = "empty";

/// Screen position of one drawn cell: `row` is the offset below the
/// status anchor, `col` the absolute 1-based terminal column. Keeping the
/// row relative means a scroll only invalidates the anchor, not the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellPos {
    row: u16,
    col: u16,
}

/// Draw-state carried between frames: the position cache from the last
/// full redraw and how many lines it took.
pub struct Renderer {
    positions: Vec<Option<CellPos>>,
    lines: u16,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            positions: Vec::new(),
            lines: 0,
        }
    }

    /// Brings the screen up to date with the application state.
    ///
    /// Chooses the full or incremental path, redraws the status line
    /// (which consumes any pending prompt), and parks the cursor on the
    /// anchor row. Exactly one flush per frame, here.
    pub fn refresh<R: Read, W: Write>(
        &mut self,
        app: &mut AppState,
        session: &mut TerminalSession<R, W>,
        size: (u16, u16),
    ) -> io::Result<()> {
        let full = app.is_dirty() || size != session.size() || app.selection_left_window();

        if full {
            session.set_size(size);
            app.relayout(size);
            self.full_redraw(app, session)?;
            app.clear_dirty();
        } else if app.dir().selected_prev().is_some() {
            self.incremental_redraw(app, session)?;
        }
        app.dir_mut().clear_prev();

        Self::draw_status(app, session)?;

        let anchor = session.anchor();
        if anchor.row > 0 {
            session.move_to(anchor.row, 1)?;
        }
        session.flush()
    }

    /// Erases the previous listing and reprints everything visible.
    ///
    /// The anchor column is learned from the first cursor query (right
    /// after the path header); the anchor row from the second, after
    /// printing, by backing up over the lines just emitted. That second
    /// query is what keeps the anchor valid when the listing pushed the
    /// terminal into scrolling.
    fn full_redraw<R: Read, W: Write>(
        &mut self,
        app: &AppState,
        session: &mut TerminalSession<R, W>,
    ) -> io::Result<()> {
        let anchor = session.anchor();
        if anchor.row > 0 {
            session.move_to(anchor.row, 1)?;
        }
        session.reset_attr()?;
        session.erase_region()?;

        let opts = *app.options();
        if opts.show_path {
            session.invert()?;
            session.bold()?;
            let path = app.dir().path().to_string_lossy();
            session.print(&path)?;
            if path != "/" {
                session.print("/")?;
            }
        }
        let head = session.query_cursor_position()?;
        session.set_anchor(head);
        session.reset_attr()?;
        session.crlf()?;
        self.lines = 1;

        let entries = app.dir().entries();
        self.positions = vec![None; entries.len()];

        if app.dir().scan_error().is_some() {
            session.print(MSG_CANT_SCAN)?;
        } else if entries.is_empty() {
            session.print(MSG_EMPTY)?;
        }

        let layout = app.layout();
        if !entries.is_empty() {
            let (start, end) = layout.window();
            let k = layout.columns();
            let mut run_col: u16 = 1;

            for i in start..=end.min(entries.len() - 1) {
                let vis = i - start;
                if layout.formatted() {
                    if vis > 0 && vis % k == 0 {
                        session.crlf()?;
                        self.lines += 1;
                    }
                    self.positions[i] = Some(CellPos {
                        row: HEADER_ROWS + (vis / k) as u16,
                        col: layout.cell_offset(i) as u16,
                    });
                    draw_cell(app, session, i)?;
                } else {
                    self.positions[i] = Some(CellPos {
                        row: HEADER_ROWS,
                        col: run_col,
                    });
                    let used = draw_cell(app, session, i)?;
                    run_col = run_col.saturating_add(used as u16);
                }
            }
        }

        let after = session.query_cursor_position()?;
        let mut anchor = session.anchor();
        anchor.row = after.row.saturating_sub(self.lines);
        session.set_anchor(anchor);
        Ok(())
    }

    /// Repaints only the previously and newly selected cells, from the
    /// cached positions. Valid only while the layout is unchanged, which
    /// [`Renderer::refresh`] guarantees by routing everything else to the
    /// full path.
    fn incremental_redraw<R: Read, W: Write>(
        &self,
        app: &AppState,
        session: &mut TerminalSession<R, W>,
    ) -> io::Result<()> {
        let anchor = session.anchor();
        if anchor.row == 0 {
            return Ok(());
        }

        if let Some(prev) = app.dir().selected_prev() {
            if let Some(pos) = self.positions.get(prev).copied().flatten() {
                session.move_to(anchor.row + pos.row, pos.col)?;
                session.reset_attr()?;
                draw_cell(app, session, prev)?;
            }
        }
        if let Some(sel) = app.dir().selected() {
            if let Some(pos) = self.positions.get(sel).copied().flatten() {
                session.move_to(anchor.row + pos.row, pos.col)?;
                draw_cell(app, session, sel)?;
            }
        }
        Ok(())
    }

    /// Rewrites the status line: the selected name in bold, then the
    /// search query or a pending one-shot prompt. Taking the prompt here
    /// is what makes error messages transient.
    fn draw_status<R: Read, W: Write>(
        app: &mut AppState,
        session: &mut TerminalSession<R, W>,
    ) -> io::Result<()> {
        let anchor = session.anchor();
        if anchor.row == 0 {
            return Ok(());
        }

        session.move_to(anchor.row, anchor.col.max(1))?;
        session.erase_to_eol()?;

        if let Some(entry) = app.dir().selected_entry() {
            let name = formatter::sanitize(&entry.name_str(), app.options().print_hex);
            session.bold()?;
            session.print(&name)?;
            session.reset_attr()?;
        }

        if app.searching() {
            let query = app.search_query().unwrap_or_default().to_owned();
            session.print(ENTRY_DELIM)?;
            session.print(":")?;
            session.print(&query)?;
        } else if let Some(prompt) = app.take_prompt() {
            session.print(ENTRY_DELIM)?;
            match prompt {
                Prompt::Err(msg) => {
                    session.set_style(Color::DarkRed, false)?;
                    session.print(&msg)?;
                }
                Prompt::Msg(msg) => session.print(&msg)?,
            }
            session.reset_attr()?;
        }
        Ok(())
    }

    /// Leaves the screen in its final state: either the listing is wiped,
    /// or the cursor is advanced past it so the shell prompt does not
    /// overwrite what the user was looking at.
    pub fn finish<R: Read, W: Write>(
        &self,
        app: &AppState,
        session: &mut TerminalSession<R, W>,
    ) -> io::Result<()> {
        let anchor = session.anchor();
        if anchor.row == 0 {
            return Ok(());
        }

        session.move_to(anchor.row, 1)?;
        session.reset_attr()?;
        if app.options().clear_on_exit {
            session.erase_region()?;
        } else {
            for _ in 0..=self.lines {
                session.crlf()?;
            }
        }
        session.flush()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

/// Prints one entry cell at the current cursor position, returning the
/// display width consumed including the trailing delimiter.
///
/// The selected entry is drawn inverted; the inversion and any class
/// color cover the name only, never the padding, so a cell's footprint is
/// identical in both states. A name wider than its column is cut and
/// marked with [`TRUNCATION_MARKER`].
fn draw_cell<R: Read, W: Write>(
    app: &AppState,
    session: &mut TerminalSession<R, W>,
    index: usize,
) -> io::Result<usize> {
    let entry = &app.dir().entries()[index];
    let opts = app.options();
    let layout = app.layout();
    let selected = app.dir().selected() == Some(index);

    if selected {
        session.invert()?;
    }
    if opts.color {
        if let Some((color, bold)) = entry.class().style() {
            session.set_style(color, bold)?;
        }
    }

    let indicator = if opts.indicators {
        entry.class().indicator()
    } else {
        None
    };
    let ind_width = usize::from(indicator.is_some());

    let sanitized = formatter::sanitize(&entry.name_str(), opts.print_hex);
    let mut used;
    let name_budget = layout.cell_width(index).saturating_sub(ind_width);
    if layout.formatted() && entry.width() > name_budget {
        // One cell of the budget goes to the marker.
        let (prefix, w) = formatter::truncate_to(&sanitized, name_budget.saturating_sub(1));
        session.print(prefix)?;
        session.reset_attr()?;
        let mut buf = [0u8; 4];
        session.print(TRUNCATION_MARKER.encode_utf8(&mut buf))?;
        used = w + 1;
    } else {
        session.print(&sanitized)?;
        session.reset_attr()?;
        used = entry.width();
    }

    if let Some(c) = indicator {
        let mut buf = [0u8; 4];
        session.print(c.encode_utf8(&mut buf))?;
        used += 1;
    }

    if layout.formatted() {
        let cell = layout.cell_width(index);
        if used < cell {
            session.print(&" ".repeat(cell - used))?;
            used = cell;
        }
    }

    // In single-line mode the last entry gets no delimiter, so an
    // exactly-full line never wraps.
    if layout.formatted() || index + 1 < app.dir().entries().len() {
        session.print(ENTRY_DELIM)?;
        used += DELIM_WIDTH;
    }
    Ok(used)
}

/// One-shot listing for the non-interactive mode: the same column layout,
/// written with plain line feeds, no escapes, no cursor queries. Suitable
/// for a pipe.
pub fn print_listing(
    dir: &DirState,
    opts: &Options,
    term_cols: usize,
    out: &mut impl Write,
) -> io::Result<()> {
    if let Some(err) = dir.scan_error() {
        return writeln!(out, "{MSG_CANT_SCAN}: {err}");
    }
    let entries = dir.entries();
    if entries.is_empty() {
        return writeln!(out, "{MSG_EMPTY}");
    }

    let layout = Layout::compute(entries, opts.indicators, term_cols, usize::MAX, 0);
    for (i, entry) in entries.iter().enumerate() {
        if layout.formatted() && i > 0 && i % layout.columns() == 0 {
            out.write_all(b"\n")?;
        }

        let indicator = if opts.indicators {
            entry.class().indicator()
        } else {
            None
        };
        let ind_width = usize::from(indicator.is_some());

        let sanitized = formatter::sanitize(&entry.name_str(), opts.print_hex);
        let mut used;
        let name_budget = layout.cell_width(i).saturating_sub(ind_width);
        if layout.formatted() && entry.width() > name_budget {
            let (prefix, w) = formatter::truncate_to(&sanitized, name_budget.saturating_sub(1));
            write!(out, "{prefix}{TRUNCATION_MARKER}")?;
            used = w + 1;
        } else {
            write!(out, "{sanitized}")?;
            used = entry.width();
        }
        if let Some(c) = indicator {
            write!(out, "{c}")?;
            used += 1;
        }
        if layout.formatted() {
            let cell = layout.cell_width(i);
            if used < cell {
                write!(out, "{}", " ".repeat(cell - used))?;
            }
        }
        if layout.formatted() || i + 1 < entries.len() {
            write!(out, "{ENTRY_DELIM}")?;
        }
    }
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fm::ScanOptions;
    use std::fs::File;
    use tempfile::TempDir;

    /// Yields one scripted cursor-position reply per read call, the way a
    /// terminal answers one query at a time.
    struct ScriptedReplies {
        replies: Vec<&'static [u8]>,
        next: usize,
    }

    impl ScriptedReplies {
        fn new(replies: Vec<&'static [u8]>) -> Self {
            ScriptedReplies { replies, next: 0 }
        }
    }

    impl Read for ScriptedReplies {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.next >= self.replies.len() {
                return Ok(0);
            }
            let reply = self.replies[self.next];
            self.next += 1;
            buf[..reply.len()].copy_from_slice(reply);
            Ok(reply.len())
        }
    }

    fn app_with(names: &[&str], options: Options) -> (TempDir, AppState) {
        let tmp = TempDir::new().unwrap();
        for name in names {
            File::create(tmp.path().join(name)).unwrap();
        }
        let dir = DirState::open(tmp.path(), options.scan()).unwrap();
        let app = AppState::new(dir, options, "vim".into(), None);
        (tmp, app)
    }

    fn count_queries(bytes: &[u8]) -> usize {
        bytes.windows(4).filter(|w| *w == b"\x1b[6n").count()
    }

    #[test]
    fn full_redraw_queries_twice_and_compensates_for_scroll() {
        let (_tmp, mut app) = app_with(&["a", "b", "c"], Options::default());
        let mut out = Vec::new();
        // Header reply says row 5; the post-draw reply says row 8 even
        // though only two lines were added, as if the terminal scrolled.
        let input = ScriptedReplies::new(vec![b"\x1b[5;9R", b"\x1b[8;1R"]);
        let mut session = TerminalSession::new(input, &mut out);
        let mut renderer = Renderer::new();

        renderer.refresh(&mut app, &mut session, (80, 24)).unwrap();

        assert_eq!(session.anchor().row, 8 - renderer.lines);
        assert_eq!(session.anchor().col, 9);
        assert!(!app.is_dirty());
        drop(session);
        assert_eq!(count_queries(&out), 2);
        let text = String::from_utf8_lossy(&out);
        for name in ["a", "b", "c"] {
            assert!(text.contains(name));
        }
    }

    #[test]
    fn incremental_refresh_sends_no_queries_and_no_erase() {
        let (_tmp, mut app) = app_with(&["aa", "bb", "cc"], Options::default());

        let input = ScriptedReplies::new(vec![b"\x1b[1;1R", b"\x1b[2;1R"]);
        let mut first = Vec::new();
        let mut session = TerminalSession::new(input, &mut first);
        let mut renderer = Renderer::new();
        renderer.refresh(&mut app, &mut session, (80, 24)).unwrap();

        // An in-page cursor move takes the incremental path.
        app.dir_mut().select(1);
        let mut second = Vec::new();
        let mut session2 = TerminalSession::new(ScriptedReplies::new(vec![]), &mut second);
        session2.set_size((80, 24));
        session2.set_anchor(session.anchor());
        renderer.refresh(&mut app, &mut session2, (80, 24)).unwrap();
        drop(session2);

        assert_eq!(count_queries(&second), 0);
        assert!(!second.windows(3).any(|w| w == b"\x1b[J".as_slice()));
        // Both the reverted and the newly selected cell were reprinted.
        let text = String::from_utf8_lossy(&second);
        assert!(text.contains("aa"));
        assert!(text.contains("bb"));
    }

    #[test]
    fn resize_forces_a_full_redraw() {
        let (_tmp, mut app) = app_with(&["one", "two"], Options::default());

        let mut out = Vec::new();
        let input = ScriptedReplies::new(vec![b"\x1b[1;1R", b"\x1b[2;1R", b"\x1b[1;1R", b"\x1b[2;1R"]);
        let mut session = TerminalSession::new(input, &mut out);
        let mut renderer = Renderer::new();
        renderer.refresh(&mut app, &mut session, (80, 24)).unwrap();
        renderer.refresh(&mut app, &mut session, (60, 24)).unwrap();
        drop(session);

        assert_eq!(count_queries(&out), 4);
    }

    #[test]
    fn unreadable_directory_reports_instead_of_listing() {
        // The directory vanishes between scans.
        let tmp = TempDir::new().unwrap();
        let doomed = tmp.path().join("doomed");
        std::fs::create_dir(&doomed).unwrap();
        let mut dir = DirState::open(&doomed, ScanOptions::default()).unwrap();
        std::fs::remove_dir(dir.path()).unwrap();
        dir.reload(ScanOptions::default());
        assert!(dir.scan_error().is_some());

        let mut app = AppState::new(dir, Options::default(), "vim".into(), None);
        let mut out = Vec::new();
        let input = ScriptedReplies::new(vec![b"\x1b[1;1R", b"\x1b[2;1R"]);
        let mut session = TerminalSession::new(input, &mut out);
        Renderer::new().refresh(&mut app, &mut session, (80, 24)).unwrap();
        drop(session);

        assert!(String::from_utf8_lossy(&out).contains(MSG_CANT_SCAN));
    }

    #[test]
    fn status_line_shows_search_query() {
        let (_tmp, mut app) = app_with(&["alpha"], Options::default());
        app.apply(crate::app::InputEvent::StartSearch);
        app.apply(crate::app::InputEvent::SearchChar('a'));
        app.mark_dirty();

        let mut out = Vec::new();
        let input = ScriptedReplies::new(vec![b"\x1b[1;1R", b"\x1b[2;1R"]);
        let mut session = TerminalSession::new(input, &mut out);
        Renderer::new().refresh(&mut app, &mut session, (80, 24)).unwrap();
        drop(session);

        assert!(String::from_utf8_lossy(&out).contains(":a"));
    }

    #[test]
    fn prompt_is_consumed_after_one_frame() {
        let (_tmp, mut app) = app_with(&["a"], Options::default());
        app.prompt_err("nope".into());

        let mut out = Vec::new();
        let input = ScriptedReplies::new(vec![b"\x1b[1;1R", b"\x1b[2;1R"]);
        let mut session = TerminalSession::new(input, &mut out);
        Renderer::new().refresh(&mut app, &mut session, (80, 24)).unwrap();
        drop(session);

        assert!(String::from_utf8_lossy(&out).contains("nope"));
        assert!(app.take_prompt().is_none());
    }

    #[test]
    fn finish_clears_or_advances() {
        let (_tmp, mut app) = app_with(&["a", "b"], Options::default());

        let mut out = Vec::new();
        let input = ScriptedReplies::new(vec![b"\x1b[1;1R", b"\x1b[2;1R"]);
        let mut session = TerminalSession::new(input, &mut out);
        let mut renderer = Renderer::new();
        renderer.refresh(&mut app, &mut session, (80, 24)).unwrap();

        let mut tail = Vec::new();
        let mut end_session = TerminalSession::new(ScriptedReplies::new(vec![]), &mut tail);
        end_session.set_anchor(session.anchor());
        renderer.finish(&app, &mut end_session).unwrap();
        drop(end_session);
        let crlfs = tail.windows(2).filter(|w| *w == b"\r\n").count();
        assert_eq!(crlfs as u16, renderer.lines + 1);
    }

    #[test]
    fn print_listing_is_plain_text() {
        let (_tmp, app) = app_with(&["bb", "aa"], Options::default());
        let mut out = Vec::new();
        print_listing(app.dir(), app.options(), 80, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains('\x1b'));
        assert!(text.contains("aa"));
        // Sorted order survives into the one-shot listing.
        assert!(text.find("aa").unwrap() < text.find("bb").unwrap());
    }

    #[test]
    fn print_listing_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = DirState::open(tmp.path(), ScanOptions::default()).unwrap();
        let mut out = Vec::new();
        print_listing(&dir, &Options::default(), 80, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), MSG_EMPTY);
    }
}
