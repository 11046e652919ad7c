//! DCPU-16 CPU registers.
//!
//! The DCPU-16 has 8 general registers (A, B, C, X, Y, Z, I, J) and three
//! special ones:
//! - SP: stack pointer, the stack grows toward lower addresses
//! - PC: program counter
//! - O: overflow, written by the arithmetic opcodes
//!
//! All fields are private so that every mutation goes through an accessor.

use super::Word;
use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Assembly names of the general registers, by index.
pub const REGISTER_NAMES: [&str; NUM_REGISTERS] = ["A", "B", "C", "X", "Y", "Z", "I", "J"];

/// The DCPU-16 register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    general: [Word; NUM_REGISTERS],
    sp: Word,
    pc: Word,
    overflow: Word,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Read general register `index` (0-7).
    ///
    /// # Panics
    /// Panics if index is out of range.
    #[inline]
    pub fn register(&self, index: usize) -> Word {
        self.general[index]
    }

    /// Write general register `index` (0-7).
    ///
    /// # Panics
    /// Panics if index is out of range.
    #[inline]
    pub fn set_register(&mut self, index: usize, value: Word) {
        self.general[index] = value;
    }

    pub fn stack_pointer(&self) -> Word {
        self.sp
    }

    pub fn set_stack_pointer(&mut self, value: Word) {
        self.sp = value;
    }

    pub fn program_counter(&self) -> Word {
        self.pc
    }

    pub fn set_program_counter(&mut self, value: Word) {
        self.pc = value;
    }

    pub fn overflow(&self) -> Word {
        self.overflow
    }

    pub fn set_overflow(&mut self, value: Word) {
        self.overflow = value;
    }

    /// Return SP, then increment it (POP).
    pub fn stack_pointer_and_increment(&mut self) -> Word {
        let old = self.sp;
        self.sp = self.sp.wrapping_add(1);
        old
    }

    /// Decrement SP, then return the new value (PUSH).
    pub fn stack_pointer_and_decrement(&mut self) -> Word {
        self.sp = self.sp.wrapping_sub(1);
        self.sp
    }

    /// Address of the word following the current opcode word.
    ///
    /// Does not move PC; the dispatch loop advances it once it knows the
    /// size of both operands.
    pub fn next_program_counter(&self) -> Word {
        self.pc.wrapping_add(1)
    }
}
