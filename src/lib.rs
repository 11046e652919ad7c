//! # DCPU-16 Emulator Core
//!
//! Operand addressing modes of the DCPU-16, a 16-bit virtual CPU.
//!
//! Each instruction names its operands with 6-bit codes. The [`cpu::operand`]
//! module turns every code into a strategy that reads, writes and sizes the
//! operand against the register file and memory, which is the contract an
//! opcode dispatch loop builds on.

pub mod cpu;
pub mod image;

// Re-export commonly used types
pub use cpu::{Cpu, Memory, Registers, Word, Operand, OperandCode, OperandKind, OperandTable, InstructionWord};
pub use image::{ImageError, ProgramImage, Snapshot, load_image, parse_image, save_image, load_snapshot, save_snapshot};
