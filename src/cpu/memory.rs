//! DCPU-16 memory subsystem.
//!
//! A flat store of 65536 sixteen-bit words. Addresses are `u16`, so every
//! access wraps around the end of the address space instead of faulting.

use super::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells in the DCPU-16.
pub const MEMORY_SIZE: usize = 0x10000;

/// DCPU-16 memory: 65536 word cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Word>", into = "Vec<Word>")]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a cell by address.
    #[inline]
    pub fn read(&self, addr: Word) -> Word {
        self.cells[addr as usize]
    }

    /// Write a cell by address.
    #[inline]
    pub fn write(&mut self, addr: Word, value: Word) {
        self.cells[addr as usize] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: Word, program: &[Word]) -> Result<(), MemoryError> {
        let start = start_addr as usize;
        if start + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE - start,
            });
        }

        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    ///
    /// Stops at the end of the address space rather than wrapping.
    pub fn dump(&self, start: Word, count: usize) -> Vec<(Word, Word)> {
        let start = start as usize;
        let end = (start + count).min(MEMORY_SIZE);
        (start..end)
            .map(|i| (i as Word, self.cells[i]))
            .collect()
    }

    /// All cells holding a non-zero value, in address order.
    pub fn non_zero_cells(&self) -> Vec<(Word, Word)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &cell)| cell != 0)
            .map(|(i, &cell)| (i as Word, cell))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<Word>> for Memory {
    type Error = MemoryError;

    fn try_from(cells: Vec<Word>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize(cells.len()));
        }
        Ok(Self { cells })
    }
}

impl From<Memory> for Vec<Word> {
    fn from(mem: Memory) -> Self {
        mem.cells
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
    /// A raw cell vector does not cover the address space exactly.
    #[error("memory image has {0} cells, expected 65536")]
    WrongSize(usize),
}
