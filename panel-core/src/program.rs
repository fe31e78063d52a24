//! Program tooling: a raw memory-listing parser and a small two-pass
//! SUBLEQ assembler.
//!
//! Assembler source is line oriented and case insensitive. `;` and `//`
//! start comments. Supported forms:
//!
//! - `.def name loc [init]` — bind a variable name to a memory location
//!   with an optional initial value. The zero register `z` is predefined
//!   at address 0.
//! - `name:` — label the next instruction's address.
//! - `subleq a b c` — the bare instruction; operands are numbers,
//!   variables or labels.
//! - `mov a b`, `add a b` — pseudo-instructions expanded into subleq
//!   sequences through `z`.
//! - `hlt` — `subleq z z 0`, branching to the halt address.
//!
//! Code is placed at the fixed start address inside a 256-byte image;
//! variable initializers are applied after the code.

use std::collections::HashMap;

use crate::error::{PanelError, PanelResult};
use crate::memory::PROGRAM_START;

/// Assembled images cover the low 256 bytes of memory, the region an
/// 8-bit program counter can reach.
pub const IMAGE_SIZE: usize = 256;

#[derive(Debug, Clone)]
enum Operand {
    Value(u8),
    Label(String),
}

fn strip_comment(line: &str) -> &str {
    let line = line.split(';').next().unwrap_or("");
    line.split("//").next().unwrap_or("").trim()
}

fn parse_number(token: &str, line: usize) -> PanelResult<u8> {
    let token = token.to_lowercase();
    let (digits, radix) = match token.strip_prefix("0x") {
        Some(rest) => (rest.to_string(), 16),
        None => (token.clone(), 10),
    };
    u8::from_str_radix(&digits, radix).map_err(|_| PanelError::BadNumber {
        line,
        text: token.to_string(),
    })
}

fn tokens(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a raw memory listing: comma/whitespace separated byte values,
/// `0x` hex or decimal, with comments.
pub fn parse_listing(src: &str) -> PanelResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for (i, raw) in src.lines().enumerate() {
        for token in tokens(strip_comment(raw)) {
            bytes.push(parse_number(token, i + 1)?);
        }
    }
    if bytes.len() > crate::memory::MEM_SIZE {
        return Err(PanelError::ProgramTooLarge {
            len: bytes.len(),
            capacity: crate::memory::MEM_SIZE,
        });
    }
    Ok(bytes)
}

struct Assembler {
    vars: HashMap<String, (u8, Option<u8>)>,
    labels: HashMap<String, u8>,
    code: Vec<Operand>,
}

impl Assembler {
    fn new() -> Self {
        let mut vars = HashMap::new();
        vars.insert("z".to_string(), (0u8, None));
        Self {
            vars,
            labels: HashMap::new(),
            code: Vec::new(),
        }
    }

    fn here(&self) -> usize {
        PROGRAM_START as usize + self.code.len()
    }

    fn zero_reg(&self) -> Operand {
        Operand::Value(self.vars["z"].0)
    }

    /// Emit one subleq. `branch` of `None` targets the following
    /// instruction (the macro fall-through case).
    fn emit(&mut self, a: Operand, b: Operand, branch: Option<Operand>) -> PanelResult<()> {
        let next = self.here() + 3;
        let c = match branch {
            Some(op) => op,
            None => {
                if next > u8::MAX as usize {
                    return Err(self.too_large());
                }
                Operand::Value(next as u8)
            }
        };
        self.code.push(a);
        self.code.push(b);
        self.code.push(c);
        Ok(())
    }

    fn too_large(&self) -> PanelError {
        PanelError::ProgramTooLarge {
            len: self.code.len() + 3,
            capacity: IMAGE_SIZE - PROGRAM_START as usize,
        }
    }

    fn operand(&self, token: &str, line: usize) -> PanelResult<Operand> {
        if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Ok(Operand::Value(parse_number(token, line)?));
        }
        match self.vars.get(token) {
            Some(&(loc, _)) => Ok(Operand::Value(loc)),
            None => Ok(Operand::Label(token.to_string())),
        }
    }

    fn directive(&mut self, rest: &str, text: &str, line: usize) -> PanelResult<()> {
        let parts = tokens(rest);
        if parts.len() < 2 || parts.len() > 3 {
            return Err(PanelError::BadDirective {
                line,
                text: text.to_string(),
            });
        }
        let loc = parse_number(parts[1], line)?;
        let init = match parts.get(2) {
            Some(token) => Some(parse_number(token, line)?),
            None => None,
        };
        self.vars.insert(parts[0].to_string(), (loc, init));
        Ok(())
    }

    fn instruction(&mut self, text: &str, line: usize) -> PanelResult<()> {
        let parts = tokens(text);
        let mnemonic = parts[0];
        let need = |expected: usize| -> PanelResult<()> {
            if parts.len() != expected + 1 {
                return Err(PanelError::MissingOperand {
                    line,
                    mnemonic: mnemonic.to_string(),
                    expected,
                });
            }
            Ok(())
        };

        match mnemonic {
            "subleq" => {
                need(3)?;
                let a = self.operand(parts[1], line)?;
                let b = self.operand(parts[2], line)?;
                let c = self.operand(parts[3], line)?;
                self.emit(a, b, Some(c))
            }
            "mov" => {
                // b = a, via: clear b, z -= a, b -= z, clear z.
                need(2)?;
                let a = self.operand(parts[1], line)?;
                let b = self.operand(parts[2], line)?;
                let z = self.zero_reg();
                self.emit(b.clone(), b.clone(), None)?;
                self.emit(a, z.clone(), None)?;
                self.emit(z.clone(), b, None)?;
                self.emit(z.clone(), z, None)
            }
            "add" => {
                // b += a, via: z -= a, b -= z, clear z.
                need(2)?;
                let a = self.operand(parts[1], line)?;
                let b = self.operand(parts[2], line)?;
                let z = self.zero_reg();
                self.emit(a, z.clone(), None)?;
                self.emit(z.clone(), b, None)?;
                self.emit(z.clone(), z, None)
            }
            "hlt" => {
                need(0)?;
                let z = self.zero_reg();
                self.emit(z.clone(), z, Some(Operand::Value(0)))
            }
            _ => Err(PanelError::UnknownInstruction {
                line,
                mnemonic: mnemonic.to_string(),
            }),
        }
    }

    fn resolve(self) -> PanelResult<Vec<u8>> {
        if PROGRAM_START as usize + self.code.len() > IMAGE_SIZE {
            return Err(PanelError::ProgramTooLarge {
                len: self.code.len(),
                capacity: IMAGE_SIZE - PROGRAM_START as usize,
            });
        }

        let mut image = vec![0u8; IMAGE_SIZE];
        for (i, op) in self.code.iter().enumerate() {
            image[PROGRAM_START as usize + i] = match op {
                Operand::Value(v) => *v,
                Operand::Label(name) => *self
                    .labels
                    .get(name)
                    .ok_or_else(|| PanelError::UndefinedLabel(name.clone()))?,
            };
        }
        for &(loc, init) in self.vars.values() {
            if let Some(value) = init {
                image[loc as usize] = value;
            }
        }
        Ok(image)
    }
}

/// Assemble SUBLEQ source into a 256-byte memory image.
pub fn assemble(src: &str) -> PanelResult<Vec<u8>> {
    let mut asm = Assembler::new();

    for (i, raw) in src.lines().enumerate() {
        let line = i + 1;
        let text = strip_comment(raw).to_lowercase();
        let text = text.trim();
        // Lines of nothing but separators tokenize to nothing; treat
        // them like blank lines rather than dispatching on parts[0].
        if tokens(text).is_empty() {
            continue;
        }

        if let Some(rest) = text.strip_prefix(".def").filter(|r| {
            r.is_empty() || r.starts_with(char::is_whitespace)
        }) {
            asm.directive(rest, text, line)?;
        } else if let Some(name) = text.strip_suffix(':') {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(PanelError::EmptyLabel { line });
            }
            if asm.labels.contains_key(&name) {
                return Err(PanelError::DuplicateLabel(name));
            }
            if asm.here() > u8::MAX as usize {
                return Err(asm.too_large());
            }
            let here = asm.here() as u8;
            asm.labels.insert(name, here);
        } else {
            asm.instruction(text, line)?;
        }
    }

    asm.resolve()
}
