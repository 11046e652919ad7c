//! Operand decoder for the DCPU-16.
//!
//! Every instruction carries two 6-bit operand fields. Each of the 64 codes
//! selects an addressing mode; this module maps codes to [`Operand`]
//! strategies that read, write and size the operand against the CPU state.
//!
//! | Codes       | Mode                                   | Extra words |
//! |-------------|----------------------------------------|-------------|
//! | 0x00-0x07   | register                               | 0           |
//! | 0x08-0x0f   | `[register]`                           | 0           |
//! | 0x10-0x17   | `[next word + register]`               | 1           |
//! | 0x18        | POP (`[SP++]`)                         | 0           |
//! | 0x19        | PEEK (`[SP]`)                          | 0           |
//! | 0x1a        | PUSH (`[--SP]`)                        | 0           |
//! | 0x1b-0x1d   | SP, PC, O                              | 0           |
//! | 0x1e        | `[next word]`                          | 1           |
//! | 0x1f        | next word (literal)                    | 1           |
//! | 0x20-0x3f   | literal 0x00-0x1f                      | 0           |
//!
//! Strategies are stateless. The register file and memory are passed in
//! explicitly on every call.

use super::{Memory, Registers, Word};
use super::registers::REGISTER_NAMES;
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// A 6-bit operand code (0x00-0x3f).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OperandCode(u8);

impl OperandCode {
    /// Number of distinct operand codes.
    pub const COUNT: usize = 0x40;

    pub const POP: Self = Self(0x18);
    pub const PEEK: Self = Self(0x19);
    pub const PUSH: Self = Self(0x1A);
    pub const SP: Self = Self(0x1B);
    pub const PC: Self = Self(0x1C);
    pub const O: Self = Self(0x1D);
    pub const NEXT_WORD_INDIRECT: Self = Self(0x1E);
    pub const NEXT_WORD: Self = Self(0x1F);

    const MASK: Word = 0x3F;

    /// Take the low 6 bits of an instruction word field.
    pub const fn from_field(field: Word) -> Self {
        Self((field & Self::MASK) as u8)
    }

    /// Short-form literal operand for `value` (0x00-0x1f).
    pub fn literal(value: Word) -> Option<Self> {
        (value < 0x20).then(|| Self(0x20 + value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Every operand code in ascending order.
    pub fn all() -> impl Iterator<Item = OperandCode> {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl TryFrom<u8> for OperandCode {
    type Error = OperandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value as usize >= Self::COUNT {
            return Err(OperandError::CodeOutOfRange(value));
        }
        Ok(Self(value))
    }
}

impl From<OperandCode> for u8 {
    fn from(code: OperandCode) -> Self {
        code.0
    }
}

impl fmt::Display for OperandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Addressing-mode family of an operand code.
///
/// Register-based variants carry the general register index (0-7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// `register`
    DirectRegister(u8),
    /// `[register]`
    IndirectRegister(u8),
    /// `[next word + register]`
    IndirectNextWordPlusRegister(u8),
    /// `[SP++]`
    Pop,
    /// `[SP]`
    Peek,
    /// `[--SP]`
    Push,
    StackPointer,
    ProgramCounter,
    Overflow,
    /// `[next word]`
    NextWordIndirect,
    /// `next word`
    NextWord,
    /// Short-form literal 0x00-0x1f.
    Literal(Word),
}

impl OperandKind {
    /// Classify an operand code.
    pub fn from_code(code: OperandCode) -> Self {
        match code.value() {
            reg @ 0x00..=0x07 => OperandKind::DirectRegister(reg),
            raw @ 0x08..=0x0F => OperandKind::IndirectRegister(raw - 0x08),
            raw @ 0x10..=0x17 => OperandKind::IndirectNextWordPlusRegister(raw - 0x10),
            0x18 => OperandKind::Pop,
            0x19 => OperandKind::Peek,
            0x1A => OperandKind::Push,
            0x1B => OperandKind::StackPointer,
            0x1C => OperandKind::ProgramCounter,
            0x1D => OperandKind::Overflow,
            0x1E => OperandKind::NextWordIndirect,
            0x1F => OperandKind::NextWord,
            raw @ 0x20..=0x3F => OperandKind::Literal((raw - 0x20) as Word),
            _ => unreachable!("operand codes are 6 bits"),
        }
    }
}

/// Decode strategy bound to one operand code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    code: OperandCode,
    kind: OperandKind,
}

impl Operand {
    pub fn new(code: OperandCode) -> Self {
        Self {
            code,
            kind: OperandKind::from_code(code),
        }
    }

    pub fn code(&self) -> OperandCode {
        self.code
    }

    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    /// Produce the operand's current value.
    ///
    /// POP and PUSH move the stack pointer as part of the read: POP reads
    /// `[SP]` and then increments, PUSH decrements first and then reads the
    /// freshly reserved slot. Memory is never modified.
    pub fn read(&self, regs: &mut Registers, mem: &Memory) -> Word {
        match self.kind {
            OperandKind::DirectRegister(reg) => regs.register(reg as usize),
            OperandKind::IndirectRegister(reg) => mem.read(regs.register(reg as usize)),
            OperandKind::IndirectNextWordPlusRegister(reg) => {
                mem.read(next_word_plus_register(regs, mem, reg))
            }
            OperandKind::Pop => mem.read(regs.stack_pointer_and_increment()),
            OperandKind::Peek => mem.read(regs.stack_pointer()),
            OperandKind::Push => mem.read(regs.stack_pointer_and_decrement()),
            OperandKind::StackPointer => regs.stack_pointer(),
            OperandKind::ProgramCounter => regs.program_counter(),
            OperandKind::Overflow => regs.overflow(),
            OperandKind::NextWordIndirect => mem.read(mem.read(regs.next_program_counter())),
            OperandKind::NextWord => mem.read(regs.next_program_counter()),
            OperandKind::Literal(value) => value,
        }
    }

    /// Store `value` into the operand's location.
    ///
    /// Silently ignored for modes that are not writable (see
    /// [`Operand::is_writable`]); the dispatch loop decides which
    /// destinations an instruction may target.
    pub fn write(&self, regs: &mut Registers, mem: &mut Memory, value: Word) {
        match self.kind {
            OperandKind::DirectRegister(reg) => regs.set_register(reg as usize, value),
            OperandKind::IndirectRegister(reg) => mem.write(regs.register(reg as usize), value),
            OperandKind::IndirectNextWordPlusRegister(reg) => {
                let addr = next_word_plus_register(regs, mem, reg);
                mem.write(addr, value);
            }
            OperandKind::StackPointer => regs.set_stack_pointer(value),
            OperandKind::ProgramCounter => regs.set_program_counter(value),
            OperandKind::Overflow => regs.set_overflow(value),
            OperandKind::NextWordIndirect => {
                let addr = mem.read(regs.next_program_counter());
                mem.write(addr, value);
            }
            OperandKind::Pop
            | OperandKind::Peek
            | OperandKind::Push
            | OperandKind::NextWord
            | OperandKind::Literal(_) => {}
        }
    }

    /// Number of instruction words this mode consumes after the opcode word.
    pub fn size(&self) -> Word {
        match self.kind {
            OperandKind::IndirectNextWordPlusRegister(_)
            | OperandKind::NextWordIndirect
            | OperandKind::NextWord => 1,
            _ => 0,
        }
    }

    /// Whether [`Operand::write`] has any effect.
    pub fn is_writable(&self) -> bool {
        !matches!(
            self.kind,
            OperandKind::Pop
                | OperandKind::Peek
                | OperandKind::Push
                | OperandKind::NextWord
                | OperandKind::Literal(_)
        )
    }

    /// Family tag, for diagnostics.
    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            OperandKind::DirectRegister(_) => "DIRECT_REGISTER",
            OperandKind::IndirectRegister(_) => "INDIRECT_REGISTER",
            OperandKind::IndirectNextWordPlusRegister(_) => "INDIRECT_NEXT_WORD_PLUS_REGISTER",
            OperandKind::Pop => "POP",
            OperandKind::Peek => "PEEK",
            OperandKind::Push => "PUSH",
            OperandKind::StackPointer => "SP",
            OperandKind::ProgramCounter => "PC",
            OperandKind::Overflow => "O",
            OperandKind::NextWordIndirect => "NEXT_WORD_INDIRECT",
            OperandKind::NextWord => "NEXT_WORD",
            OperandKind::Literal(_) => "LITERAL",
        }
    }

    /// Memory address the operand refers to, if it can be computed
    /// without side effects.
    ///
    /// `None` for register-like modes, literals, and POP/PUSH (whose
    /// address depends on moving SP).
    pub fn effective_address(&self, regs: &Registers, mem: &Memory) -> Option<Word> {
        match self.kind {
            OperandKind::IndirectRegister(reg) => Some(regs.register(reg as usize)),
            OperandKind::IndirectNextWordPlusRegister(reg) => {
                Some(next_word_plus_register(regs, mem, reg))
            }
            OperandKind::Peek => Some(regs.stack_pointer()),
            OperandKind::NextWordIndirect => Some(mem.read(regs.next_program_counter())),
            OperandKind::NextWord => Some(regs.next_program_counter()),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperandKind::DirectRegister(reg) => write!(f, "{}", REGISTER_NAMES[reg as usize]),
            OperandKind::IndirectRegister(reg) => write!(f, "[{}]", REGISTER_NAMES[reg as usize]),
            OperandKind::IndirectNextWordPlusRegister(reg) => {
                write!(f, "[next+{}]", REGISTER_NAMES[reg as usize])
            }
            OperandKind::NextWordIndirect => write!(f, "[next]"),
            OperandKind::NextWord => write!(f, "next"),
            OperandKind::Literal(value) => write!(f, "0x{:02x}", value),
            _ => write!(f, "{}", self.type_tag()),
        }
    }
}

/// `[next word] + register`, wrapping.
fn next_word_plus_register(regs: &Registers, mem: &Memory, reg: u8) -> Word {
    mem.read(regs.next_program_counter())
        .wrapping_add(regs.register(reg as usize))
}

/// Build the strategy for every operand code, indexed by code.
pub fn build_all() -> [Operand; OperandCode::COUNT] {
    std::array::from_fn(|i| Operand::new(OperandCode(i as u8)))
}

/// The complete operand table for one CPU.
#[derive(Debug, Clone)]
pub struct OperandTable {
    operands: [Operand; OperandCode::COUNT],
}

impl OperandTable {
    pub fn new() -> Self {
        Self {
            operands: build_all(),
        }
    }

    #[inline]
    pub fn get(&self, code: OperandCode) -> &Operand {
        &self.operands[code.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operand> {
        self.operands.iter()
    }
}

impl Default for OperandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<OperandCode> for OperandTable {
    type Output = Operand;

    fn index(&self, code: OperandCode) -> &Operand {
        self.get(code)
    }
}

/// Errors from checked operand code construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("operand code {0:#04x} out of range (0x00-0x3f)")]
    CodeOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code(raw: u8) -> OperandCode {
        OperandCode::try_from(raw).unwrap()
    }

    fn state() -> (Registers, Memory) {
        (Registers::new(), Memory::new())
    }

    #[test]
    fn test_table_is_total() {
        let table = build_all();
        assert_eq!(table.len(), 64);
        for (i, operand) in table.iter().enumerate() {
            assert_eq!(operand.code().index(), i);
        }

        let codes: Vec<_> = OperandCode::all().collect();
        assert_eq!(codes.len(), OperandCode::COUNT);
        assert_eq!(codes.last().copied(), Some(OperandCode::from_field(0x3F)));
    }

    #[test]
    fn test_family_boundaries() {
        let table = OperandTable::new();
        let expected = [
            (0x00..=0x07, "DIRECT_REGISTER"),
            (0x08..=0x0F, "INDIRECT_REGISTER"),
            (0x10..=0x17, "INDIRECT_NEXT_WORD_PLUS_REGISTER"),
            (0x18..=0x18, "POP"),
            (0x19..=0x19, "PEEK"),
            (0x1A..=0x1A, "PUSH"),
            (0x1B..=0x1B, "SP"),
            (0x1C..=0x1C, "PC"),
            (0x1D..=0x1D, "O"),
            (0x1E..=0x1E, "NEXT_WORD_INDIRECT"),
            (0x1F..=0x1F, "NEXT_WORD"),
            (0x20..=0x3F, "LITERAL"),
        ];

        for (range, tag) in expected {
            for raw in range {
                assert_eq!(table[code(raw)].type_tag(), tag, "code {:#04x}", raw);
            }
        }
    }

    #[test]
    fn test_sizes() {
        for operand in OperandTable::new().iter() {
            let expected = match operand.code().value() {
                0x10..=0x17 | 0x1E | 0x1F => 1,
                _ => 0,
            };
            assert_eq!(operand.size(), expected, "code {}", operand.code());
        }
    }

    #[test]
    fn test_code_out_of_range() {
        assert_eq!(OperandCode::try_from(0x40u8), Err(OperandError::CodeOutOfRange(0x40)));
        assert_eq!(OperandCode::from_field(0x7F).value(), 0x3F);
        assert_eq!(OperandCode::literal(0x1F), Some(code(0x3F)));
        assert_eq!(OperandCode::literal(0x20), None);
    }

    #[test]
    fn test_literals() {
        let (mut regs, mut mem) = state();
        regs.set_register(0, 0x1234);
        mem.write(0, 0x5678);

        for raw in 0x20..=0x3F {
            let operand = Operand::new(code(raw));
            assert_eq!(operand.read(&mut regs, &mem), (raw - 0x20) as Word);

            operand.write(&mut regs, &mut mem, 0xFFFF);
            assert_eq!(operand.read(&mut regs, &mem), (raw - 0x20) as Word);
        }
        assert_eq!(regs.register(0), 0x1234);
        assert_eq!(mem.read(0), 0x5678);
        assert_eq!(mem.read(0xFFFF), 0);
    }

    #[test]
    fn test_direct_register() {
        let (mut regs, mut mem) = state();
        let operand = Operand::new(code(0x03));

        operand.write(&mut regs, &mut mem, 0xBEEF);
        assert_eq!(operand.read(&mut regs, &mem), 0xBEEF);
        for i in (0..8).filter(|&i| i != 3) {
            assert_eq!(regs.register(i), 0);
        }
        assert!(mem.non_zero_cells().is_empty());
    }

    #[test]
    fn test_indirect_register() {
        let (mut regs, mut mem) = state();
        regs.set_register(2, 0x1000);
        mem.write(0x1000, 7);
        let operand = Operand::new(code(0x0A));

        assert_eq!(operand.read(&mut regs, &mem), 7);
        operand.write(&mut regs, &mut mem, 9);
        assert_eq!(operand.read(&mut regs, &mem), 9);
        assert_eq!(mem.read(0x1000), 9);
        assert_eq!(regs.register(2), 0x1000);
    }

    #[test]
    fn test_indirect_next_word_plus_register() {
        let (mut regs, mut mem) = state();
        regs.set_program_counter(0x200);
        mem.write(0x201, 0x10);
        regs.set_register(0, 0x05);
        mem.write(0x15, 0xAA);
        let operand = Operand::new(code(0x10));

        assert_eq!(operand.effective_address(&regs, &mem), Some(0x15));
        assert_eq!(operand.read(&mut regs, &mem), 0xAA);
        operand.write(&mut regs, &mut mem, 0xBB);
        assert_eq!(mem.read(0x15), 0xBB);
        assert_eq!(operand.size(), 1);
        assert_eq!(regs.program_counter(), 0x200);
    }

    #[test]
    fn test_indirect_next_word_plus_register_wraps() {
        let (mut regs, mut mem) = state();
        // PC = 0, so the next word lives at 0x0001
        mem.write(0x0001, 0xFFFF);
        regs.set_register(7, 2);

        let operand = Operand::new(code(0x17));
        assert_eq!(operand.effective_address(&regs, &mem), Some(0x0001));
        assert_eq!(operand.read(&mut regs, &mem), 0xFFFF);
    }

    #[test]
    fn test_push_then_pop() {
        let (mut regs, mut mem) = state();
        regs.set_stack_pointer(0xFFFF);
        mem.write(0xFFFE, 0x4242);
        let push = Operand::new(OperandCode::PUSH);
        let pop = Operand::new(OperandCode::POP);

        assert_eq!(push.read(&mut regs, &mem), 0x4242);
        assert_eq!(regs.stack_pointer(), 0xFFFE);

        assert_eq!(pop.read(&mut regs, &mem), 0x4242);
        assert_eq!(regs.stack_pointer(), 0xFFFF);
    }

    #[test]
    fn test_peek_does_not_move_stack_pointer() {
        let (mut regs, mut mem) = state();
        regs.set_stack_pointer(0x8000);
        mem.write(0x8000, 3);
        let peek = Operand::new(OperandCode::PEEK);

        for _ in 0..4 {
            assert_eq!(peek.read(&mut regs, &mem), 3);
            assert_eq!(regs.stack_pointer(), 0x8000);
        }
    }

    #[test]
    fn test_stack_modes_are_not_writable() {
        let (mut regs, mut mem) = state();
        regs.set_stack_pointer(0x10);

        for c in [OperandCode::POP, OperandCode::PEEK, OperandCode::PUSH] {
            let operand = Operand::new(c);
            operand.write(&mut regs, &mut mem, 0x99);
            assert!(!operand.is_writable());
        }
        assert_eq!(regs.stack_pointer(), 0x10);
        assert!(mem.non_zero_cells().is_empty());
    }

    #[test]
    fn test_next_word() {
        let (mut regs, mut mem) = state();
        regs.set_program_counter(0x100);
        mem.write(0x101, 0x55);
        mem.write(0x55, 0x99);

        let next = Operand::new(OperandCode::NEXT_WORD);
        assert_eq!(next.read(&mut regs, &mem), 0x55);
        assert_eq!(next.size(), 1);
        next.write(&mut regs, &mut mem, 0x01);
        assert_eq!(mem.read(0x101), 0x55);

        let indirect = Operand::new(OperandCode::NEXT_WORD_INDIRECT);
        assert_eq!(indirect.read(&mut regs, &mem), 0x99);
        assert_eq!(indirect.size(), 1);
        indirect.write(&mut regs, &mut mem, 0x77);
        assert_eq!(mem.read(0x55), 0x77);

        assert_eq!(regs.program_counter(), 0x100);
    }

    #[test]
    fn test_special_registers() {
        let (mut regs, mut mem) = state();
        let cases = [(OperandCode::SP, 0x1111), (OperandCode::PC, 0x2222), (OperandCode::O, 0x3333)];

        for (c, value) in cases {
            let operand = Operand::new(c);
            operand.write(&mut regs, &mut mem, value);
            assert_eq!(operand.read(&mut regs, &mem), value);
        }
        assert_eq!(regs.stack_pointer(), 0x1111);
        assert_eq!(regs.program_counter(), 0x2222);
        assert_eq!(regs.overflow(), 0x3333);
    }

    #[test]
    fn test_display() {
        assert_eq!(Operand::new(code(0x00)).to_string(), "A");
        assert_eq!(Operand::new(code(0x0F)).to_string(), "[J]");
        assert_eq!(Operand::new(code(0x13)).to_string(), "[next+X]");
        assert_eq!(Operand::new(OperandCode::POP).to_string(), "POP");
        assert_eq!(Operand::new(OperandCode::NEXT_WORD_INDIRECT).to_string(), "[next]");
        assert_eq!(Operand::new(code(0x3F)).to_string(), "0x1f");
    }

    proptest! {
        #[test]
        fn prop_push_pop_restores_stack_pointer(sp in any::<u16>(), value in any::<u16>()) {
            let (mut regs, mut mem) = state();
            regs.set_stack_pointer(sp);

            Operand::new(OperandCode::PUSH).read(&mut regs, &mem);
            let slot = regs.stack_pointer();
            prop_assert_eq!(slot, sp.wrapping_sub(1));
            mem.write(slot, value);

            let popped = Operand::new(OperandCode::POP).read(&mut regs, &mem);
            prop_assert_eq!(popped, value);
            prop_assert_eq!(regs.stack_pointer(), sp);
        }

        #[test]
        fn prop_literal_ignores_state(raw in 0x20u8..0x40, sp in any::<u16>(), pc in any::<u16>()) {
            let (mut regs, mem) = state();
            regs.set_stack_pointer(sp);
            regs.set_program_counter(pc);

            let operand = Operand::new(code(raw));
            prop_assert_eq!(operand.read(&mut regs, &mem), (raw - 0x20) as Word);
            prop_assert_eq!(regs.stack_pointer(), sp);
            prop_assert_eq!(regs.program_counter(), pc);
        }
    }
}
