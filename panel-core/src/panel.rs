//! Front-panel state, the hardware I/O seam and the blocking key API.
//!
//! `Panel` owns the digit latches and the keyboard state and is stepped
//! by the tick context. `SharedPanel` is the handle the foreground
//! context uses: non-blocking `peek_key` and blocking `get_key` with the
//! shift-capture protocol. Blocking is realized as polling with a fixed
//! sleep, so the foreground never holds the panel lock across a wait and
//! the tick context is never starved.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::display::{glyph, DisplayBuffer, GLYPH_DASH, DIGITS};
use crate::keyboard::{key_position, KeyboardState, KEY_NONE, KEY_SHIFT, SECONDARY_KEYS};

/// Sleep between polls of the keyboard state.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The port-register boundary between the panel logic and whatever
/// renders it: segment/digit-select lines and the keypad column/row
/// lines. Implementations must not block; they run inside the tick.
pub trait PanelIo: Send {
    /// Latch the segment drivers for the digit about to be lit.
    /// `None` leaves the digit dark.
    fn drive_digit(&mut self, index: usize, segments: Option<u8>);

    /// Drive the column-select lines for the given keypad column.
    fn select_column(&mut self, column: usize);

    /// Probe the row lines against the driven column. `Some(row)` when
    /// exactly one row reads low.
    fn probe_rows(&mut self) -> Option<u8>;
}

/// Lets a backend be shared between the ticker and another thread
/// (test scripts, the CLI event pump).
impl<T: PanelIo> PanelIo for Arc<Mutex<T>> {
    fn drive_digit(&mut self, index: usize, segments: Option<u8>) {
        lock(self).drive_digit(index, segments);
    }

    fn select_column(&mut self, column: usize) {
        lock(self).select_column(column);
    }

    fn probe_rows(&mut self) -> Option<u8> {
        lock(self).probe_rows()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // Panel state is plain bytes; a panicking peer cannot leave an
    // invariant broken, so poisoning is recovered rather than surfaced.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The complete front-panel state: digit latches, keyboard state and
/// the multiplexer position.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub display: DisplayBuffer,
    pub keyboard: KeyboardState,
    digit: usize,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    /// One hardware tick: render the current digit and advance to the
    /// next, then run one keyboard scan step. Persistence of vision
    /// makes the six digits appear simultaneously lit.
    pub fn tick(&mut self, io: &mut dyn PanelIo) {
        let code = self.display.digit(self.digit);
        io.drive_digit(self.digit, glyph(code));
        self.digit = (self.digit + 1) % DIGITS;
        self.keyboard.scan(io);
    }
}

/// Shared handle to the panel. Clone is cheap (just clones the Arc).
/// The tick thread and the foreground context each lock it only for
/// field-sized updates, so readers see at most a one-tick-old view.
#[derive(Clone, Default)]
pub struct SharedPanel {
    inner: Arc<Mutex<Panel>>,
}

impl SharedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure under the panel lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut Panel) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    /// Currently latched key code, or `KEY_NONE`. Non-blocking.
    pub fn peek_key(&self) -> u8 {
        self.with(|p| p.keyboard.code)
    }

    /// Block until a key press resolves to a code, then until the key is
    /// released. A shift ("2nd") press blanks the display to dashes,
    /// captures the next hex digit, maps it through the secondary table
    /// and restores the display before returning. Never returns the
    /// sentinel; the display is left exactly as found.
    pub fn get_key(&self) -> u8 {
        let code = self.wait_code();

        if code == KEY_SHIFT {
            let saved = self.with(|p| {
                let saved = p.display.snapshot();
                p.display.fill(GLYPH_DASH);
                saved
            });

            self.wait_release();
            let second = self.wait_code();
            let mapped = SECONDARY_KEYS[(second & 0xF) as usize];
            self.wait_release();

            self.with(|p| p.display.restore(saved));
            mapped
        } else {
            self.wait_release();
            code
        }
    }

    /// Block until no key is held.
    pub fn wait_release(&self) {
        while self.with(|p| p.keyboard.held) {
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn wait_code(&self) -> u8 {
        loop {
            let code = self.peek_key();
            if code != KEY_NONE {
                return code;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Panel backend for tests: records the last driven segment image and
/// synthesizes key contacts.
#[derive(Debug, Default)]
pub struct HeadlessPanel {
    /// Last segment pattern driven per digit; `None` is dark.
    pub lit: [Option<u8>; DIGITS],
    selected_column: usize,
    contact: Option<(u8, u8)>,
}

impl HeadlessPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold down the key at (row, column).
    pub fn press(&mut self, row: u8, column: u8) {
        self.contact = Some((row, column));
    }

    /// Hold down the key carrying a primary code.
    pub fn press_key(&mut self, code: u8) {
        self.contact = key_position(code);
    }

    pub fn release(&mut self) {
        self.contact = None;
    }
}

impl PanelIo for HeadlessPanel {
    fn drive_digit(&mut self, index: usize, segments: Option<u8>) {
        self.lit[index] = segments;
    }

    fn select_column(&mut self, column: usize) {
        self.selected_column = column;
    }

    fn probe_rows(&mut self) -> Option<u8> {
        self.contact
            .and_then(|(row, col)| (col as usize == self.selected_column).then_some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{BLANK, SEGMENT_TABLE};
    use crate::keyboard::KEY_GO;
    use crate::tick::Ticker;
    use std::time::Instant;

    fn wait_for(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_micros(200));
        }
    }

    #[test]
    fn test_multiplexer_drives_glyph_or_blank() {
        // Exhaustive over the whole code space: <= 19 renders the table
        // entry, anything above is dark.
        let mut panel = Panel::new();
        let mut io = HeadlessPanel::new();

        for v in 0..=255u8 {
            panel.display.fill(v);
            for _ in 0..DIGITS {
                panel.tick(&mut io);
            }
            let expected = SEGMENT_TABLE.get(v as usize).copied();
            for i in 0..DIGITS {
                assert_eq!(io.lit[i], expected, "code {v:#04X} digit {i}");
            }
        }
    }

    #[test]
    fn test_multiplexer_cycles_digits_in_order() {
        struct Recorder(Vec<usize>);
        impl PanelIo for Recorder {
            fn drive_digit(&mut self, index: usize, _segments: Option<u8>) {
                self.0.push(index);
            }
            fn select_column(&mut self, _column: usize) {}
            fn probe_rows(&mut self) -> Option<u8> {
                None
            }
        }

        let mut panel = Panel::new();
        let mut io = Recorder(Vec::new());
        for _ in 0..8 {
            panel.tick(&mut io);
        }
        assert_eq!(io.0, vec![0, 1, 2, 3, 4, 5, 0, 1]);
    }

    #[test]
    fn test_get_key_returns_released_code() {
        let panel = SharedPanel::new();
        let io = Arc::new(Mutex::new(HeadlessPanel::new()));
        let _ticker = Ticker::spawn(panel.clone(), io.clone(), Duration::from_micros(100));

        let script = {
            let panel = panel.clone();
            let io = io.clone();
            thread::spawn(move || {
                lock(&io).press_key(0x05);
                wait_for("latch", || panel.peek_key() == 0x05);
                // Hold well past the poll interval so get_key observes
                // the code before the release.
                thread::sleep(Duration::from_millis(50));
                lock(&io).release();
            })
        };

        assert_eq!(panel.get_key(), 0x05);
        script.join().unwrap();
    }

    #[test]
    fn test_peek_key_is_nonblocking() {
        let panel = SharedPanel::new();
        assert_eq!(panel.peek_key(), KEY_NONE);
    }

    #[test]
    fn test_shift_capture_maps_and_restores_display() {
        let panel = SharedPanel::new();
        panel.with(|p| {
            for i in 0..DIGITS {
                p.display.set_digit(i, i as u8);
            }
        });
        let before = panel.with(|p| p.display.snapshot());

        let io = Arc::new(Mutex::new(HeadlessPanel::new()));
        let _ticker = Ticker::spawn(panel.clone(), io.clone(), Duration::from_micros(100));

        let script = {
            let panel = panel.clone();
            let io = io.clone();
            thread::spawn(move || {
                lock(&io).press_key(KEY_SHIFT);
                // The dash fill is the observable signal that get_key has
                // entered the capture sequence.
                wait_for("dash blank", || {
                    panel.with(|p| (0..DIGITS).all(|i| p.display.digit(i) == GLYPH_DASH))
                });
                lock(&io).release();
                wait_for("shift release", || !panel.with(|p| p.keyboard.held));
                // Leave the release window open long enough for the
                // polling side to observe it before the next press.
                thread::sleep(Duration::from_millis(50));

                lock(&io).press_key(0x0C);
                wait_for("second latch", || panel.peek_key() == 0x0C);
                // Display must still show dashes while the capture is live.
                panel.with(|p| assert_eq!(p.display.digit(0), GLYPH_DASH));
                thread::sleep(Duration::from_millis(50));
                lock(&io).release();
            })
        };

        assert_eq!(panel.get_key(), 0x8F);
        script.join().unwrap();
        assert_eq!(panel.with(|p| p.display.snapshot()), before);
    }

    #[test]
    fn test_go_key_observable_via_peek() {
        let panel = SharedPanel::new();
        let io = Arc::new(Mutex::new(HeadlessPanel::new()));
        let _ticker = Ticker::spawn(panel.clone(), io.clone(), Duration::from_micros(100));

        lock(&io).press_key(KEY_GO);
        wait_for("go latch", || panel.peek_key() == KEY_GO);
        lock(&io).release();
        wait_for("go release", || panel.peek_key() == KEY_NONE);
    }

    #[test]
    fn test_blank_code_renders_dark() {
        let mut panel = Panel::new();
        let mut io = HeadlessPanel::new();
        panel.display.set_digit(0, BLANK);
        panel.tick(&mut io);
        assert_eq!(io.lit[0], None);
    }
}
