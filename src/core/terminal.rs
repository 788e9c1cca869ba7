//! Terminal session handling and the main event loop for peek.
//!
//! Owns raw-mode setup/teardown, the buffered byte reader over stdin, the
//! cursor-position query protocol and the small set of escape primitives
//! the renderer draws with. peek never enters the alternate screen: it
//! draws into the normal buffer and must therefore recover its own
//! position from the terminal with `ESC [ 6 n` round trips.

use crate::app::keymap;
use crate::app::{AppState, Flow};
use crate::ui::render::Renderer;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Color, Print, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};

use std::io::{self, Read, Write};

/// A 1-based terminal coordinate, as reported by the cursor position
/// report. `row == 0` means "not established yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermPos {
    pub row: u16,
    pub col: u16,
}

/// Scoped raw mode: non-canonical, unechoed input with a hidden cursor,
/// restored on every exit path (including unwinding).
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), Hide)?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
        let _ = disable_raw_mode();
    }
}

/// Small buffered reader over the terminal input stream.
///
/// The buffer exists so the cursor-position query can discard stale
/// type-ahead it has already pulled in before scanning for the reply.
pub struct InputReader<R: Read> {
    inner: R,
    buf: [u8; 64],
    pos: usize,
    len: usize,
}

impl<R: Read> InputReader<R> {
    pub fn new(inner: R) -> Self {
        InputReader {
            inner,
            buf: [0; 64],
            pos: 0,
            len: 0,
        }
    }

    /// Blocking read of the next input byte.
    pub fn next_byte(&mut self) -> io::Result<u8> {
        if self.pos >= self.len {
            let n = self.inner.read(&mut self.buf)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input stream closed",
                ));
            }
            self.pos = 0;
            self.len = n;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Discards everything already buffered, so stale type-ahead is not
    /// misread as part of a terminal reply.
    pub fn drain(&mut self) {
        self.pos = 0;
        self.len = 0;
    }
}

/// States of the cursor-position-report scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CprState {
    SeekEsc,
    SeekBracket,
    Row,
    Col,
}

/// Incremental parser for the `ESC [ row ; col R` reply.
///
/// Any unexpected byte restarts the scan from [CprState::SeekEsc] (the
/// byte itself may begin a new candidate sequence); a malformed or partial
/// reply is therefore recovered locally and never surfaces as an error.
pub struct CprParser {
    state: CprState,
    row: u16,
    col: u16,
}

impl CprParser {
    pub fn new() -> Self {
        CprParser {
            state: CprState::SeekEsc,
            row: 0,
            col: 0,
        }
    }

    /// Feeds one byte; returns the reported position once a complete
    /// reply has been seen.
    pub fn advance(&mut self, byte: u8) -> Option<TermPos> {
        match self.state {
            CprState::SeekEsc => {
                if byte == 0x1B {
                    self.begin();
                }
            }
            CprState::SeekBracket => {
                if byte == b'[' {
                    self.state = CprState::Row;
                } else {
                    self.restart(byte);
                }
            }
            CprState::Row => match byte {
                b'0'..=b'9' => {
                    self.row = self.row.saturating_mul(10).saturating_add((byte - b'0') as u16);
                }
                b';' => self.state = CprState::Col,
                _ => self.restart(byte),
            },
            CprState::Col => match byte {
                b'0'..=b'9' => {
                    self.col = self.col.saturating_mul(10).saturating_add((byte - b'0') as u16);
                }
                b'R' => {
                    let pos = TermPos {
                        row: self.row,
                        col: self.col,
                    };
                    *self = CprParser::new();
                    return Some(pos);
                }
                _ => self.restart(byte),
            },
        }
        None
    }

    fn begin(&mut self) {
        self.state = CprState::SeekBracket;
        self.row = 0;
        self.col = 0;
    }

    fn restart(&mut self, byte: u8) {
        self.state = CprState::SeekEsc;
        if byte == 0x1B {
            self.begin();
        }
    }
}

impl Default for CprParser {
    fn default() -> Self {
        CprParser::new()
    }
}

/// One interactive terminal: the input byte stream, the output stream,
/// the last known size and the status anchor the renderer positions
/// against. Generic over its streams so rendering is testable against
/// byte buffers.
pub struct TerminalSession<R: Read, W: Write> {
    input: InputReader<R>,
    out: W,
    size: (u16, u16), // (cols, rows)
    anchor: TermPos,
}

impl<R: Read, W: Write> TerminalSession<R, W> {
    pub fn new(input: R, out: W) -> Self {
        TerminalSession {
            input: InputReader::new(input),
            out,
            size: (0, 0),
            anchor: TermPos::default(),
        }
    }

    // Accessors

    #[inline]
    pub fn input_mut(&mut self) -> &mut InputReader<R> {
        &mut self.input
    }

    #[inline]
    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn set_size(&mut self, size: (u16, u16)) {
        self.size = size;
    }

    #[inline]
    pub fn anchor(&self) -> TermPos {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: TermPos) {
        self.anchor = anchor;
    }

    /// Asks the terminal where the cursor is and blocks for the reply.
    ///
    /// This is the only point where the engine needs an answer from the
    /// terminal rather than merely sending output. A terminal that never
    /// replies will hang here; there is deliberately no timeout.
    pub fn query_cursor_position(&mut self) -> io::Result<TermPos> {
        self.input.drain();
        self.out.write_all(b"\x1b[6n")?;
        self.out.flush()?;

        let mut parser = CprParser::new();
        loop {
            let byte = self.input.next_byte()?;
            if let Some(pos) = parser.advance(byte) {
                return Ok(pos);
            }
        }
    }

    // Drawing primitives, consumed only by the renderer. All writes are
    // queued; callers flush once per frame.

    /// Moves to a 1-based row/column.
    pub fn move_to(&mut self, row: u16, col: u16) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(col.saturating_sub(1), row.saturating_sub(1))
        )
    }

    /// Erases everything below the cursor plus the cursor's own line.
    pub fn erase_region(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::FromCursorDown),
            Clear(ClearType::CurrentLine)
        )
    }

    /// Erases from the cursor to the end of the line.
    pub fn erase_to_eol(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::UntilNewLine))
    }

    pub fn invert(&mut self) -> io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reverse))
    }

    pub fn bold(&mut self) -> io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Bold))
    }

    pub fn reset_attr(&mut self) -> io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset))
    }

    pub fn set_style(&mut self, color: Color, bold: bool) -> io::Result<()> {
        queue!(self.out, SetForegroundColor(color))?;
        if bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        Ok(())
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))
    }

    /// Line break that also returns the carriage; raw mode disables
    /// output post-processing, so a bare `\n` would stair-step.
    pub fn crlf(&mut self) -> io::Result<()> {
        queue!(self.out, Print("\r\n"))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Runs the interactive session: raw mode on, event loop until quit, then
/// leave the screen the way the options ask for (cleared or advanced past
/// the listing) before cooked mode comes back.
pub fn run_terminal(app: &mut AppState) -> io::Result<()> {
    let _guard = RawModeGuard::new()?;
    let mut session = TerminalSession::new(io::stdin(), io::stdout());
    let mut renderer = Renderer::new();

    let result = event_loop(app, &mut session, &mut renderer);

    let cleanup = renderer.finish(app, &mut session);
    result.and(cleanup)
}

/// One input event is fully processed (state change, optional rescan,
/// optional relayout, redraw) before the next byte is read.
fn event_loop<R: Read, W: Write>(
    app: &mut AppState,
    session: &mut TerminalSession<R, W>,
    renderer: &mut Renderer,
) -> io::Result<()> {
    loop {
        let size = crossterm::terminal::size()?;
        renderer.refresh(app, session, size)?;

        let event = keymap::read_event(session.input_mut(), app.searching())?;
        match app.apply(event) {
            Flow::Continue => {}
            Flow::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut CprParser, bytes: &[u8]) -> Option<TermPos> {
        let mut result = None;
        for &b in bytes {
            if let Some(pos) = parser.advance(b) {
                result = Some(pos);
            }
        }
        result
    }

    #[test]
    fn cpr_parses_plain_reply() {
        let mut p = CprParser::new();
        let pos = feed(&mut p, b"\x1b[24;80R").unwrap();
        assert_eq!(pos, TermPos { row: 24, col: 80 });
    }

    #[test]
    fn cpr_skips_leading_noise() {
        let mut p = CprParser::new();
        let pos = feed(&mut p, b"qqq\x1b[3;7R").unwrap();
        assert_eq!(pos, TermPos { row: 3, col: 7 });
    }

    #[test]
    fn cpr_restarts_on_malformed_sequence() {
        // An arrow key (ESC [ A) arrives before the actual reply.
        let mut p = CprParser::new();
        let pos = feed(&mut p, b"\x1b[A\x1b[12;1R").unwrap();
        assert_eq!(pos, TermPos { row: 12, col: 1 });
    }

    #[test]
    fn cpr_handles_esc_inside_broken_sequence() {
        // The bad byte is itself an escape and begins the real reply.
        let mut p = CprParser::new();
        let pos = feed(&mut p, b"\x1b[9\x1b[5;6R").unwrap();
        assert_eq!(pos, TermPos { row: 5, col: 6 });
    }

    #[test]
    fn cpr_incomplete_reply_yields_nothing() {
        let mut p = CprParser::new();
        assert_eq!(feed(&mut p, b"\x1b[10;"), None);
    }

    #[test]
    fn query_round_trip_over_buffers() -> Result<(), Box<dyn std::error::Error>> {
        let reply: &[u8] = b"\x1b[17;42R";
        let mut out = Vec::new();
        let mut session = TerminalSession::new(reply, &mut out);
        let pos = session.query_cursor_position()?;
        assert_eq!(pos, TermPos { row: 17, col: 42 });
        assert!(out.ends_with(b"\x1b[6n"));
        Ok(())
    }

    #[test]
    fn input_reader_drain_discards_buffered() -> Result<(), Box<dyn std::error::Error>> {
        let bytes: &[u8] = b"abcdef";
        let mut reader = InputReader::new(bytes);
        assert_eq!(reader.next_byte()?, b'a');
        // Everything else is in the buffer now; drain forgets it.
        reader.drain();
        assert!(reader.next_byte().is_err());
        Ok(())
    }
}
