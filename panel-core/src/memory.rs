//! Raw storage cells behind the memory-mapped address space.
//!
//! The display-aliased window (addresses 1-9) is handled one level up,
//! in [`crate::machine::Machine`]; this module only holds the plain
//! byte cells. Addresses wrap modulo the memory size, so the menu
//! layer's 16-bit address pointer aliases the 1 KiB space consistently
//! instead of walking out of bounds.

use crate::error::{PanelError, PanelResult};

/// Bytes of emulated memory. Power of two; addresses are masked.
pub const MEM_SIZE: usize = 1024;

/// Execution starts here on every run.
pub const PROGRAM_START: u8 = 10;

/// Fixed-size byte-addressable storage.
pub struct AddressSpace {
    cells: Box<[u8; MEM_SIZE]>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self {
            cells: Box::new([0; MEM_SIZE]),
        }
    }
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(addr: u16) -> usize {
        addr as usize & (MEM_SIZE - 1)
    }

    pub fn get(&self, addr: u16) -> u8 {
        self.cells[Self::index(addr)]
    }

    pub fn set(&mut self, addr: u16, value: u8) {
        self.cells[Self::index(addr)] = value;
    }

    /// Copy a program image into memory starting at `addr`.
    pub fn load_at(&mut self, addr: u16, data: &[u8]) -> PanelResult<()> {
        let start = addr as usize;
        if start + data.len() > MEM_SIZE {
            return Err(PanelError::ProgramTooLarge {
                len: data.len(),
                capacity: MEM_SIZE.saturating_sub(start),
            });
        }
        self.cells[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_wrap() {
        let mut mem = AddressSpace::new();
        mem.set(1034, 0x42);
        assert_eq!(mem.get(10), 0x42);
        assert_eq!(mem.get(1034), 0x42);
        assert_eq!(mem.get(0xFFFF), mem.get(1023));
    }

    #[test]
    fn test_load_at_bounds() {
        let mut mem = AddressSpace::new();
        mem.load_at(0, &[1, 2, 3]).unwrap();
        assert_eq!(mem.get(2), 3);

        let huge = vec![0u8; MEM_SIZE + 1];
        assert!(mem.load_at(0, &huge).is_err());
        assert!(mem.load_at(1020, &[0; 8]).is_err());
    }
}
