//! Six-digit seven-segment display buffer and glyph table.

/// Number of seven-segment digits on the panel.
pub const DIGITS: usize = 6;

/// Any code above the last glyph index renders as a dark digit.
pub const BLANK: u8 = 0xFF;

/// Segment driver patterns. Indices 0-15 are the hex digits 0-F,
/// 0x10-0x13 the symbols `[`, `]`, `=`, `-` used by the menu screens.
pub const SEGMENT_TABLE: [u8; 20] = [
    0x02, 0x9E, 0x24, 0x0C, 0x98, 0x48, 0x40, 0x1E, //
    0x00, 0x08, 0x10, 0xC0, 0x62, 0x84, 0x60, 0x70, //
    0x62, // [
    0x0E, // ]
    0x6E, // =
    0xFC, // -
];

pub const GLYPH_LBRACKET: u8 = 0x10;
pub const GLYPH_RBRACKET: u8 = 0x11;
pub const GLYPH_EQUALS: u8 = 0x12;
pub const GLYPH_DASH: u8 = 0x13;

/// Segment pattern for a display code, or `None` when the code is
/// out of glyph range and the digit stays dark.
pub fn glyph(code: u8) -> Option<u8> {
    SEGMENT_TABLE.get(code as usize).copied()
}

/// The six digit latches. Slot 0 is the rightmost digit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayBuffer {
    slots: [u8; DIGITS],
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digit(&self, index: usize) -> u8 {
        self.slots[index]
    }

    pub fn set_digit(&mut self, index: usize, code: u8) {
        self.slots[index] = code;
    }

    /// Set every digit to the same code.
    pub fn fill(&mut self, code: u8) {
        self.slots = [code; DIGITS];
    }

    /// Copy of the current digit latches, for save/restore around the
    /// shift-capture protocol and menu transitions.
    pub fn snapshot(&self) -> [u8; DIGITS] {
        self.slots
    }

    pub fn restore(&mut self, saved: [u8; DIGITS]) {
        self.slots = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_lookup() {
        assert_eq!(glyph(0), Some(0x02));
        assert_eq!(glyph(0xF), Some(0x70));
        assert_eq!(glyph(GLYPH_DASH), Some(0xFC));
        assert_eq!(glyph(20), None);
        assert_eq!(glyph(BLANK), None);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut buf = DisplayBuffer::new();
        buf.set_digit(0, 0xA5);
        buf.set_digit(5, 0x03);
        let saved = buf.snapshot();

        buf.fill(GLYPH_DASH);
        assert!((0..DIGITS).all(|i| buf.digit(i) == GLYPH_DASH));

        buf.restore(saved);
        assert_eq!(buf.digit(0), 0xA5);
        assert_eq!(buf.digit(5), 0x03);
        assert_eq!(buf.digit(3), 0);
    }
}
