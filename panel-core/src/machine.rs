//! The single-instruction machine: memory-mapped address space plus the
//! subtract-and-branch execution loop.
//!
//! Every instruction is three operand bytes `a b c`: subtract `mem[a]`
//! from `mem[b]` (unsigned 8-bit wraparound), store the result at `b`,
//! and branch to `c` exactly when the result is 0. Because the
//! difference wraps, zero is the only observable "non-positive" value;
//! existing programs depend on that.

use crate::display::BLANK;
use crate::keyboard::KEY_GO;
use crate::memory::{AddressSpace, PROGRAM_START};
use crate::panel::SharedPanel;
use crate::{HaltReason, RunInfo};

/// State of the machine after one instruction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// The program counter reached 0.
    Halted,
    /// The cancel key was observed.
    Cancelled,
}

/// The trainer machine: 1 KiB of memory with the display window mapped
/// in, a program counter, and the shared panel for key sampling.
pub struct Machine {
    mem: AddressSpace,
    panel: SharedPanel,
    pc: u8,
    /// Enable per-instruction tracing to stderr.
    pub trace: bool,
}

impl Machine {
    pub fn new(panel: SharedPanel) -> Self {
        Self {
            mem: AddressSpace::new(),
            panel,
            pc: PROGRAM_START,
            trace: false,
        }
    }

    pub fn panel(&self) -> &SharedPanel {
        &self.panel
    }

    /// Load a program image at address 0.
    pub fn load(&mut self, image: &[u8]) -> crate::PanelResult<()> {
        self.mem.load_at(0, image)
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u8) {
        self.pc = pc;
    }

    /// Read a byte through the memory map. Addresses 1-6 return the low
    /// nibble of the corresponding display slot; 7-9 return a packed
    /// nibble pair (high nibble from the odd slot, low from the even).
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            1..=6 => self
                .panel
                .with(|p| p.display.digit(addr as usize - 1) & 0xF),
            7..=9 => self.panel.with(|p| {
                let even = (addr as usize - 7) * 2;
                let lo = p.display.digit(even) & 0xF;
                let hi = p.display.digit(even + 1) & 0xF;
                hi << 4 | lo
            }),
            _ => self.mem.get(addr),
        }
    }

    /// Write a byte through the memory map. Addresses 1-6 store the full
    /// byte in the display slot (only the low nibble renders); 7-9 split
    /// the value into two nibbles across the slot pair.
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            1..=6 => self
                .panel
                .with(|p| p.display.set_digit(addr as usize - 1, value)),
            7..=9 => self.panel.with(|p| {
                let even = (addr as usize - 7) * 2;
                p.display.set_digit(even, value & 0xF);
                p.display.set_digit(even + 1, value >> 4 & 0xF);
            }),
            _ => self.mem.set(addr, value),
        }
    }

    fn fetch(&mut self) -> u8 {
        let byte = self.read(self.pc as u16);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// Execute one instruction. The cancel key is sampled twice per
    /// step, right after the store and again after the branch decision,
    /// to keep input latency below one instruction.
    pub fn step(&mut self) -> StepOutcome {
        let at = self.pc;
        let a = self.fetch();
        let b = self.fetch();
        let c = self.fetch();

        let result = self.read(b as u16).wrapping_sub(self.read(a as u16));
        self.write(b as u16, result);

        if self.trace {
            eprintln!(
                "[STEP] pc={:#04X} a={:#04X} b={:#04X} c={:#04X} result={:#04X}",
                at, a, b, c, result
            );
        }

        if self.panel.peek_key() == KEY_GO {
            return StepOutcome::Cancelled;
        }
        if result == 0 {
            self.pc = c;
        }
        if self.panel.peek_key() == KEY_GO {
            return StepOutcome::Cancelled;
        }

        if self.pc == 0 {
            StepOutcome::Halted
        } else {
            StepOutcome::Running
        }
    }

    /// Run from the fixed start address until halt or cancellation. The
    /// display is blanked on entry; programs paint it through the mapped
    /// window. Before returning, waits for any held key to be released
    /// and consumes one blocking key press so the operator acknowledges
    /// the halted state.
    pub fn run(&mut self) -> RunInfo {
        self.panel.with(|p| p.display.fill(BLANK));
        self.pc = PROGRAM_START;

        let mut steps = 0u64;
        let reason = loop {
            if self.pc == 0 {
                break HaltReason::Halted;
            }
            steps += 1;
            match self.step() {
                StepOutcome::Running => {}
                StepOutcome::Halted => break HaltReason::Halted,
                StepOutcome::Cancelled => break HaltReason::Cancelled,
            }
        };

        self.panel.wait_release();
        self.panel.get_key();

        RunInfo {
            reason,
            steps,
            pc: self.pc,
        }
    }
}
