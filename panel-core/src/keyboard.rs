//! Keypad matrix constants and the scan/debounce state machine.
//!
//! The keypad is a 4x5 matrix: four rows of hex digits plus a fifth
//! column of function keys. One column is driven per scan step; a key
//! press pulls its row line low. The scanner debounces by requiring the
//! same contact on two consecutive ticks before latching a code, and it
//! stops cycling columns while a key is held so the scan stays parked on
//! the pressed column until release.

use crate::panel::PanelIo;

pub const ROWS: usize = 4;
pub const COLUMNS: usize = 5;

/// Sentinel: no key latched.
pub const KEY_NONE: u8 = 0xFF;
/// "2nd" prefix key; the next hex digit selects a secondary code.
pub const KEY_SHIFT: u8 = 0x4F;
pub const KEY_PLUS: u8 = 0x3F;
pub const KEY_MINUS: u8 = 0x2F;
/// Start/cancel key.
pub const KEY_GO: u8 = 0x1F;

/// Primary key codes by (row, column). Column 4 is the function column.
pub const KEY_MATRIX: [[u8; COLUMNS]; ROWS] = [
    [0x0C, 0x0D, 0x0E, 0x0F, KEY_SHIFT],
    [0x08, 0x09, 0x0A, 0x0B, KEY_PLUS],
    [0x04, 0x05, 0x06, 0x07, KEY_MINUS],
    [0x00, 0x01, 0x02, 0x03, KEY_GO],
];

/// Secondary codes reached via the "2nd" key followed by a hex digit.
/// Only digits C-F carry a function; the rest map to 0.
pub const SECONDARY_KEYS: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x8F, 0x7F, 0x6F, 0x5F,
];

/// (row, column) of a primary key code, for backends that synthesize
/// contacts from host key events.
pub fn key_position(code: u8) -> Option<(u8, u8)> {
    for (row, cols) in KEY_MATRIX.iter().enumerate() {
        for (col, &key) in cols.iter().enumerate() {
            if key == code {
                return Some((row as u8, col as u8));
            }
        }
    }
    None
}

/// Debounce/latch state. Written only by the tick context; the
/// foreground only ever reads `code` and `held`.
#[derive(Debug, Clone)]
pub struct KeyboardState {
    /// Column currently driven by the scanner.
    pub column: usize,
    /// A contact was seen on the previous tick but is not yet confirmed.
    pub debounced: bool,
    /// A confirmed key is currently held down.
    pub held: bool,
    /// Row of the current contact, if any.
    pub row: Option<u8>,
    /// Latched key code, or `KEY_NONE`.
    pub code: u8,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self {
            column: 0,
            debounced: false,
            held: false,
            row: None,
            code: KEY_NONE,
        }
    }
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One scan step. Contact on the driven column arms the debounce on
    /// the first tick and latches the matrix code on the second; the
    /// column only advances while no contact is present.
    pub fn scan(&mut self, io: &mut dyn PanelIo) {
        match io.probe_rows() {
            Some(row) => {
                self.row = Some(row);
                if !self.debounced {
                    self.debounced = true;
                } else if !self.held {
                    self.code = KEY_MATRIX[row as usize][self.column];
                    self.held = true;
                }
            }
            None => {
                self.row = None;
                self.debounced = false;
                self.held = false;
                self.code = KEY_NONE;
                self.column = (self.column + 1) % COLUMNS;
                io.select_column(self.column);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::HeadlessPanel;

    #[test]
    fn test_one_tick_contact_does_not_latch() {
        let mut kbd = KeyboardState::new();
        let mut io = HeadlessPanel::new();

        io.press(2, 0);
        kbd.scan(&mut io);
        assert_eq!(kbd.code, KEY_NONE);
        assert!(kbd.debounced);
        assert!(!kbd.held);

        io.release();
        kbd.scan(&mut io);
        assert_eq!(kbd.code, KEY_NONE);
        assert!(!kbd.debounced);
        assert_eq!(kbd.column, 1);
    }

    #[test]
    fn test_two_tick_contact_latches_and_holds() {
        let mut kbd = KeyboardState::new();
        let mut io = HeadlessPanel::new();

        io.press(2, 0);
        kbd.scan(&mut io);
        kbd.scan(&mut io);
        assert_eq!(kbd.code, KEY_MATRIX[2][0]);
        assert!(kbd.held);

        // Held contact keeps the latch stable and the column parked.
        for _ in 0..10 {
            kbd.scan(&mut io);
        }
        assert_eq!(kbd.code, KEY_MATRIX[2][0]);
        assert_eq!(kbd.column, 0);

        io.release();
        kbd.scan(&mut io);
        assert_eq!(kbd.code, KEY_NONE);
        assert!(!kbd.held);
        assert_eq!(kbd.column, 1);
    }

    #[test]
    fn test_scan_parks_on_pressed_column() {
        let mut kbd = KeyboardState::new();
        let mut io = HeadlessPanel::new();

        // Key sits in column 2; the scanner reaches it while cycling.
        io.press(0, 2);
        kbd.scan(&mut io); // no contact on column 0 -> advance to 1
        kbd.scan(&mut io); // no contact on column 1 -> advance to 2
        assert_eq!(kbd.column, 2);
        kbd.scan(&mut io); // armed
        kbd.scan(&mut io); // latched
        assert_eq!(kbd.code, KEY_MATRIX[0][2]);
    }

    #[test]
    fn test_function_column_latches() {
        let mut kbd = KeyboardState::new();
        let mut io = HeadlessPanel::new();

        io.press(3, 4);
        for _ in 0..COLUMNS + 2 {
            kbd.scan(&mut io);
        }
        assert_eq!(kbd.code, KEY_GO);
    }

    #[test]
    fn test_key_position_roundtrip() {
        assert_eq!(key_position(0x00), Some((3, 0)));
        assert_eq!(key_position(KEY_SHIFT), Some((0, 4)));
        assert_eq!(key_position(KEY_NONE), None);
        for row in 0..ROWS {
            for col in 0..COLUMNS {
                let code = KEY_MATRIX[row][col];
                assert_eq!(key_position(code), Some((row as u8, col as u8)));
            }
        }
    }
}
