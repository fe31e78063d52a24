//! Error types for the front-panel trainer.

use thiserror::Error;

/// Errors that can occur outside the sentinel-based runtime paths
/// (program tooling and file handling).
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("program too large: {len} bytes into {capacity}-byte image")]
    ProgramTooLarge { len: usize, capacity: usize },

    #[error("line {line}: unknown instruction: {mnemonic}")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("line {line}: malformed directive: {text}")]
    BadDirective { line: usize, text: String },

    #[error("line {line}: {mnemonic} expects {expected} operand(s)")]
    MissingOperand {
        line: usize,
        mnemonic: String,
        expected: usize,
    },

    #[error("line {line}: bad number: {text}")]
    BadNumber { line: usize, text: String },

    #[error("line {line}: empty label name")]
    EmptyLabel { line: usize },

    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("undefined label: {0}")]
    UndefinedLabel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for front-panel operations.
pub type PanelResult<T> = Result<T, PanelError>;
