//! Key decoding for peek.
//!
//! Input arrives as raw bytes (the cursor-position protocol needs to own
//! the stream, so there is no event-library reader in between). Browsing
//! keys are decoded with the arrow/function escape sequences VT-style
//! terminals send; search mode consumes plain characters, including
//! multi-byte UTF-8 input.

use crate::core::terminal::InputReader;

use std::io::{self, Read};

/// A cursor movement over the entry grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// One decoded user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Move(Direction),
    Parent,
    Enter,
    Reload,
    Edit,
    Open,
    Exec,
    Shell,
    StartSearch,
    Quit,
    SearchChar(char),
    SearchBackspace,
    SearchAccept,
    SearchCancel,
}

/// Blocking read of the next meaningful input event. Unbound keys are
/// swallowed here so the caller never sees them.
pub fn read_event<R: Read>(input: &mut InputReader<R>, searching: bool) -> io::Result<InputEvent> {
    if searching {
        read_search_event(input)
    } else {
        read_browse_event(input)
    }
}

fn read_browse_event<R: Read>(input: &mut InputReader<R>) -> io::Result<InputEvent> {
    loop {
        let event = match input.next_byte()? {
            0x08 | 0x7F => InputEvent::Parent, // Backspace / DEL
            b'\r' | b'\n' => InputEvent::Enter,
            0x1B => match read_escape(input)? {
                Some(ev) => ev,
                None => continue,
            },
            b'e' | b'E' => InputEvent::Edit,
            b'h' | b'H' => InputEvent::Move(Direction::Left),
            b'j' | b'J' => InputEvent::Move(Direction::Down),
            b'k' | b'K' => InputEvent::Move(Direction::Up),
            b'l' | b'L' => InputEvent::Move(Direction::Right),
            b'o' | b'O' => InputEvent::Open,
            b'q' | b'Q' => InputEvent::Quit,
            b'r' | b'R' => InputEvent::Reload,
            b'x' | b'X' => InputEvent::Exec,
            b'/' => InputEvent::StartSearch,
            b'!' => InputEvent::Shell,
            _ => continue,
        };
        return Ok(event);
    }
}

/// Decodes the remainder of an `ESC [`-introduced sequence: the arrow
/// keys and F10 (`ESC [ 2 1 ~`). Anything else is dropped.
fn read_escape<R: Read>(input: &mut InputReader<R>) -> io::Result<Option<InputEvent>> {
    if input.next_byte()? != b'[' {
        return Ok(None);
    }
    let event = match input.next_byte()? {
        b'A' => Some(InputEvent::Move(Direction::Up)),
        b'B' => Some(InputEvent::Move(Direction::Down)),
        b'C' => Some(InputEvent::Move(Direction::Right)),
        b'D' => Some(InputEvent::Move(Direction::Left)),
        b'2' => {
            if input.next_byte()? == b'1' && input.next_byte()? == b'~' {
                Some(InputEvent::Quit)
            } else {
                None
            }
        }
        _ => None,
    };
    Ok(event)
}

fn read_search_event<R: Read>(input: &mut InputReader<R>) -> io::Result<InputEvent> {
    loop {
        let first = input.next_byte()?;
        let event = match first {
            0x1B => InputEvent::SearchCancel,
            b'\r' | b'\n' => InputEvent::SearchAccept,
            0x08 | 0x7F => InputEvent::SearchBackspace,
            0x20..=0x7E => InputEvent::SearchChar(first as char),
            b if b >= 0x80 => match read_utf8_tail(input, b)? {
                Some(c) => InputEvent::SearchChar(c),
                None => continue,
            },
            _ => continue, // other control bytes
        };
        return Ok(event);
    }
}

/// Completes a multi-byte UTF-8 character whose first byte was already
/// read. Malformed sequences are dropped, mirroring the resynchronizing
/// escape scanner.
fn read_utf8_tail<R: Read>(input: &mut InputReader<R>, first: u8) -> io::Result<Option<char>> {
    let len = match first {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Ok(None),
    };
    let mut buf = [first, 0, 0, 0];
    for slot in buf.iter_mut().take(len).skip(1) {
        let b = input.next_byte()?;
        if b & 0xC0 != 0x80 {
            return Ok(None);
        }
        *slot = b;
    }
    Ok(std::str::from_utf8(&buf[..len])
        .ok()
        .and_then(|s| s.chars().next()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8], searching: bool) -> InputEvent {
        let mut input = InputReader::new(bytes);
        read_event(&mut input, searching).unwrap()
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(decode(b"\x1b[A", false), InputEvent::Move(Direction::Up));
        assert_eq!(decode(b"\x1b[B", false), InputEvent::Move(Direction::Down));
        assert_eq!(decode(b"\x1b[C", false), InputEvent::Move(Direction::Right));
        assert_eq!(decode(b"\x1b[D", false), InputEvent::Move(Direction::Left));
    }

    #[test]
    fn vi_keys_and_case() {
        assert_eq!(decode(b"j", false), InputEvent::Move(Direction::Down));
        assert_eq!(decode(b"K", false), InputEvent::Move(Direction::Up));
    }

    #[test]
    fn f10_quits() {
        assert_eq!(decode(b"\x1b[21~", false), InputEvent::Quit);
        assert_eq!(decode(b"q", false), InputEvent::Quit);
    }

    #[test]
    fn enter_and_parent() {
        assert_eq!(decode(b"\r", false), InputEvent::Enter);
        assert_eq!(decode(b"\x7f", false), InputEvent::Parent);
        assert_eq!(decode(b"\x08", false), InputEvent::Parent);
    }

    #[test]
    fn unbound_bytes_are_skipped() {
        // 'z' is unbound; the following 'q' is the first real event.
        assert_eq!(decode(b"zq", false), InputEvent::Quit);
    }

    #[test]
    fn incomplete_escape_is_dropped() {
        assert_eq!(decode(b"\x1bXq", false), InputEvent::Quit);
        assert_eq!(decode(b"\x1b[Zq", false), InputEvent::Quit);
    }

    #[test]
    fn search_mode_characters() {
        assert_eq!(decode(b"a", true), InputEvent::SearchChar('a'));
        assert_eq!(decode(b"\x1b", true), InputEvent::SearchCancel);
        assert_eq!(decode(b"\r", true), InputEvent::SearchAccept);
        assert_eq!(decode(b"\x7f", true), InputEvent::SearchBackspace);
    }

    #[test]
    fn search_mode_utf8() {
        let bytes = "é".as_bytes();
        assert_eq!(decode(bytes, true), InputEvent::SearchChar('é'));

        let wide = "日x".as_bytes();
        assert_eq!(decode(wide, true), InputEvent::SearchChar('日'));
    }

    #[test]
    fn search_mode_malformed_utf8_is_dropped() {
        // A lone continuation byte, then a valid character.
        assert_eq!(decode(&[0xC3, 0x41, b'a'], true), InputEvent::SearchChar('a'));
    }
}
