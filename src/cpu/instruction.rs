//! Instruction word fields.
//!
//! A basic DCPU-16 instruction is one word laid out as `bbbbbbaaaaaaoooo`:
//! a 4-bit opcode and two 6-bit operand codes. Operands that consume a
//! next word make the instruction longer; this module only splits the
//! fields and measures the length, it does not execute anything.

use super::{OperandCode, OperandTable, Word};
use serde::{Serialize, Deserialize};
use std::fmt;

/// A raw instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionWord(Word);

impl InstructionWord {
    /// Pack an opcode and two operand codes into a word.
    pub fn encode(opcode: u8, a: OperandCode, b: OperandCode) -> Self {
        let word = (opcode as Word & 0xF)
            | ((a.value() as Word) << 4)
            | ((b.value() as Word) << 10);
        Self(word)
    }

    pub fn raw(self) -> Word {
        self.0
    }

    /// Low 4 bits.
    pub fn opcode(self) -> u8 {
        (self.0 & 0xF) as u8
    }

    /// First operand, bits 4-9.
    pub fn a(self) -> OperandCode {
        OperandCode::from_field(self.0 >> 4)
    }

    /// Second operand, bits 10-15.
    pub fn b(self) -> OperandCode {
        OperandCode::from_field(self.0 >> 10)
    }

    /// Total words spanned: the opcode word plus any next words.
    pub fn length(self, table: &OperandTable) -> Word {
        1 + table.get(self.a()).size() + table.get(self.b()).size()
    }
}

impl From<Word> for InstructionWord {
    fn from(word: Word) -> Self {
        Self(word)
    }
}

impl fmt::Display for InstructionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
