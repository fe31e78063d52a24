//! Terminal front-panel backend: renders the digit latches to a line of
//! text and synthesizes matrix contacts from host key events.

use std::io::stdout;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use panel_core::{PanelIo, DIGITS, SEGMENT_TABLE};

/// How long one host key event keeps the matrix contact closed. Key
/// repeat keeps extending it, so holding a key down behaves like
/// holding the physical button.
pub const HOLD_WINDOW: Duration = Duration::from_millis(90);

struct Contact {
    row: u8,
    column: u8,
    until: Instant,
}

/// Contact state shared between the event pump and the ticker.
#[derive(Clone, Default)]
pub struct SharedKeys {
    inner: Arc<Mutex<Option<Contact>>>,
}

impl SharedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close (or keep closed) the contact at (row, column).
    pub fn press(&self, row: u8, column: u8) {
        *self.lock() = Some(Contact {
            row,
            column,
            until: Instant::now() + HOLD_WINDOW,
        });
    }

    fn current(&self) -> Option<(u8, u8)> {
        let mut guard = self.lock();
        match guard.as_ref() {
            Some(c) if c.until > Instant::now() => Some((c.row, c.column)),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Contact>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The terminal stands in for the seven-segment display and the keypad
/// wiring. Digit images are latched per multiplex step and the line is
/// redrawn only when the image actually changes.
pub struct TerminalPanel {
    keys: SharedKeys,
    lit: [Option<u8>; DIGITS],
    selected_column: usize,
    dirty: bool,
}

impl TerminalPanel {
    pub fn new(keys: SharedKeys) -> Self {
        Self {
            keys,
            lit: [None; DIGITS],
            selected_column: 0,
            dirty: true,
        }
    }

    fn redraw(&self) {
        let mut line = String::from("[ ");
        for i in (0..DIGITS).rev() {
            line.push(glyph_char(self.lit[i]));
            line.push(' ');
        }
        line.push(']');
        let _ = execute!(
            stdout(),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line)
        );
    }
}

/// Decode a segment pattern back to a character. Patterns shared by two
/// glyphs (e.g. `C` and `[` light the same segments) decode to the
/// first table entry, exactly as they look on real hardware.
fn glyph_char(pattern: Option<u8>) -> char {
    const CHARS: [char; 20] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'b', 'C', 'd', 'E', 'F', '[', ']',
        '=', '-',
    ];
    match pattern {
        Some(p) => SEGMENT_TABLE
            .iter()
            .position(|&s| s == p)
            .map(|i| CHARS[i])
            .unwrap_or('?'),
        None => ' ',
    }
}

impl PanelIo for TerminalPanel {
    fn drive_digit(&mut self, index: usize, segments: Option<u8>) {
        if self.lit[index] != segments {
            self.lit[index] = segments;
            self.dirty = true;
        }
        // Repaint once per full multiplex sweep, not per digit.
        if index == DIGITS - 1 && self.dirty {
            self.redraw();
            self.dirty = false;
        }
    }

    fn select_column(&mut self, column: usize) {
        self.selected_column = column;
    }

    fn probe_rows(&mut self) -> Option<u8> {
        self.keys
            .current()
            .filter(|&(_, col)| col as usize == self.selected_column)
            .map(|(row, _)| row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_char_decodes_digits() {
        assert_eq!(glyph_char(Some(0x02)), '0');
        assert_eq!(glyph_char(Some(0x70)), 'F');
        assert_eq!(glyph_char(Some(0xFC)), '-');
        assert_eq!(glyph_char(None), ' ');
    }

    #[test]
    fn test_contact_expires() {
        let keys = SharedKeys::new();
        assert_eq!(keys.current(), None);
        keys.press(2, 1);
        assert_eq!(keys.current(), Some((2, 1)));
        std::thread::sleep(HOLD_WINDOW + Duration::from_millis(10));
        assert_eq!(keys.current(), None);
    }
}
