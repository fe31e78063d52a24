//! SUBLEQ Front-Panel Trainer Core
//!
//! This crate emulates a single-board trainer computer: a hex keypad and a
//! six-digit seven-segment display drive a one-instruction
//! (subtract-and-branch-if-zero) machine over 1 KiB of memory.
//!
//! # Architecture
//!
//! The emulator uses a layered design:
//! - `PanelIo` trait: the port-register boundary (segment drivers, digit
//!   select, column select, row sense)
//! - `Panel`: display multiplexer + keyboard scanner, stepped once per tick
//! - `SharedPanel`: shared handle with the blocking key API
//! - `Machine`: memory-mapped address space + SUBLEQ execution loop
//! - `program`: SUBLEQ assembler and raw listing parser

pub mod display;
pub mod error;
pub mod keyboard;
pub mod machine;
pub mod memory;
pub mod panel;
pub mod program;
pub mod tick;

pub use display::{DisplayBuffer, BLANK, DIGITS, SEGMENT_TABLE};
pub use error::{PanelError, PanelResult};
pub use keyboard::{
    key_position, KeyboardState, KEY_GO, KEY_MATRIX, KEY_MINUS, KEY_NONE, KEY_PLUS, KEY_SHIFT,
    SECONDARY_KEYS,
};
pub use machine::{Machine, StepOutcome};
pub use memory::{AddressSpace, MEM_SIZE, PROGRAM_START};
pub use panel::{HeadlessPanel, Panel, PanelIo, SharedPanel, POLL_INTERVAL};
pub use program::{assemble, parse_listing};
pub use tick::{Ticker, TICK_PERIOD};

/// Reason the execution loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Program counter reached 0 (natural halt)
    Halted,
    /// The cancel key was observed mid-run
    Cancelled,
}

/// Information about a finished run.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub reason: HaltReason,
    pub steps: u64,
    pub pc: u8,
}
