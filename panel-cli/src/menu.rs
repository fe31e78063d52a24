//! The operator interface: mode dispatcher, main menu and the
//! address/data entry screens. These consume only the core's public
//! operations: `get_key`, `read`, `write` and `run`.

use panel_core::display::{BLANK, GLYPH_EQUALS, GLYPH_LBRACKET, GLYPH_RBRACKET};
use panel_core::{Machine, KEY_GO, KEY_MINUS, KEY_PLUS};

/// Secondary code opening the data-entry screen (2nd + C).
pub const KEY_DATA_INPUT: u8 = 0x8F;
/// Secondary code opening the address-entry screen (2nd + D).
pub const KEY_ADDR_INPUT: u8 = 0x7F;

/// Active operator mode. Exactly one runs at a time; all of them share
/// the single foreground context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    MainMenu,
    DataInput,
    AddrInput,
    Emulator,
}

/// Drives the mode transitions around a machine. The address pointer is
/// 16 bits and survives across screens, wider than the memory it walks;
/// the core wraps out-of-range addresses.
pub struct Dispatcher {
    machine: Machine,
    addr_ptr: u16,
}

impl Dispatcher {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            addr_ptr: 0,
        }
    }

    pub fn run(mut self) {
        let mut mode = Mode::MainMenu;
        loop {
            mode = match mode {
                Mode::MainMenu => self.main_menu(),
                Mode::DataInput => self.data_input(),
                Mode::AddrInput => self.addr_input(),
                Mode::Emulator => {
                    self.machine.run();
                    Mode::MainMenu
                }
            };
        }
    }

    /// Shows `[====]` and waits for a mode selection.
    fn main_menu(&mut self) -> Mode {
        self.machine.panel().with(|p| {
            p.display.set_digit(0, GLYPH_RBRACKET);
            for i in 1..=4 {
                p.display.set_digit(i, GLYPH_EQUALS);
            }
            p.display.set_digit(5, GLYPH_LBRACKET);
        });

        match self.machine.panel().get_key() {
            KEY_DATA_INPUT => Mode::DataInput,
            KEY_ADDR_INPUT => Mode::AddrInput,
            KEY_GO => Mode::Emulator,
            _ => Mode::MainMenu,
        }
    }

    /// Data entry: the four left digits show the address, the two right
    /// digits the byte under it. Hex keys enter the byte nibble by
    /// nibble, `+`/`-` step the address.
    fn data_input(&mut self) -> Mode {
        let mut second_nibble = false;
        loop {
            let addr = self.addr_ptr;
            let value = self.machine.read(addr);
            self.machine.panel().with(|p| {
                p.display.set_digit(0, value & 0xF);
                p.display.set_digit(1, value >> 4 & 0xF);
                p.display.set_digit(2, (addr & 0xF) as u8);
                p.display.set_digit(3, (addr >> 4 & 0xF) as u8);
                p.display.set_digit(4, (addr >> 8 & 0xF) as u8);
                p.display.set_digit(5, (addr >> 12 & 0xF) as u8);
            });

            let key = self.machine.panel().get_key();
            if key == KEY_PLUS {
                self.addr_ptr = self.addr_ptr.wrapping_add(1);
                second_nibble = false;
            } else if key == KEY_MINUS {
                self.addr_ptr = self.addr_ptr.wrapping_sub(1);
                second_nibble = false;
            } else if key <= 0xF {
                if !second_nibble {
                    self.machine.write(addr, key);
                    second_nibble = true;
                } else {
                    let value = self.machine.read(addr);
                    self.machine.write(addr, value << 4 | key);
                    second_nibble = false;
                }
            } else if key >= 0x5F && key != KEY_DATA_INPUT {
                return Mode::MainMenu;
            } else if key == KEY_GO {
                return Mode::Emulator;
            }
        }
    }

    /// Address entry: hex keys fill the pointer from the high nibble
    /// down, `+`/`-` step it.
    fn addr_input(&mut self) -> Mode {
        let mut pos = 0u8;
        loop {
            let addr = self.addr_ptr;
            self.machine.panel().with(|p| {
                p.display.set_digit(0, BLANK);
                p.display.set_digit(1, BLANK);
                p.display.set_digit(2, (addr & 0xF) as u8);
                p.display.set_digit(3, (addr >> 4 & 0xF) as u8);
                p.display.set_digit(4, (addr >> 8 & 0xF) as u8);
                p.display.set_digit(5, (addr >> 12 & 0xF) as u8);
            });

            let key = self.machine.panel().get_key();
            if key == KEY_PLUS {
                self.addr_ptr = self.addr_ptr.wrapping_add(1);
            } else if key == KEY_MINUS {
                self.addr_ptr = self.addr_ptr.wrapping_sub(1);
            } else if key <= 0xF {
                let shift = 12 - 4 * u16::from(pos);
                self.addr_ptr = self.addr_ptr & !(0xF << shift) | u16::from(key) << shift;
                pos = (pos + 1) % 4;
            } else if key >= 0x5F && key != KEY_ADDR_INPUT {
                return Mode::MainMenu;
            } else if key == KEY_GO {
                return Mode::Emulator;
            }
        }
    }
}
