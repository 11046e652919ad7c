//! CPU state for the DCPU-16.
//!
//! This module implements the parts of the machine an instruction's
//! operands touch:
//! - 65536 sixteen-bit memory cells
//! - 8 general registers plus SP, PC and O
//! - the 64-entry operand addressing-mode table

pub mod memory;
pub mod registers;
pub mod operand;
pub mod instruction;
pub mod machine;

/// The machine's native 16-bit data unit.
pub type Word = u16;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use operand::{build_all, Operand, OperandCode, OperandError, OperandKind, OperandTable};
pub use instruction::InstructionWord;
pub use machine::Cpu;
