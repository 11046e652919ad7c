//! The DCPU-16 machine state.
//!
//! Owns the register file, memory and the operand table built for them.
//! Fetching and executing opcodes is left to the dispatch loop that drives
//! this state; it uses the operand entry points below for both operand
//! slots and then advances PC by the instruction length.

use super::{InstructionWord, Memory, MemoryError, Operand, OperandCode, OperandTable, Registers, Word};

/// A DCPU-16 CPU instance.
#[derive(Clone)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    operands: OperandTable,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self::from_parts(Registers::new(), Memory::new())
    }

    /// Build a CPU around existing state.
    pub fn from_parts(regs: Registers, mem: Memory) -> Self {
        Self {
            regs,
            mem,
            operands: OperandTable::new(),
        }
    }

    /// Reset registers and memory to zero.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)?;
        log::debug!("loaded {} words at 0x0000", program.len());
        Ok(())
    }

    pub fn operands(&self) -> &OperandTable {
        &self.operands
    }

    pub fn operand(&self, code: OperandCode) -> &Operand {
        self.operands.get(code)
    }

    /// Read an operand against this CPU's state.
    pub fn read_operand(&mut self, code: OperandCode) -> Word {
        let operand = self.operands.get(code);
        let value = operand.read(&mut self.regs, &self.mem);
        log::trace!("read {} ({}) -> {:#06x}", operand, operand.type_tag(), value);
        value
    }

    /// Write an operand against this CPU's state.
    pub fn write_operand(&mut self, code: OperandCode, value: Word) {
        let operand = self.operands.get(code);
        if !operand.is_writable() {
            log::trace!("ignored write of {:#06x} to {}", value, operand);
        }
        operand.write(&mut self.regs, &mut self.mem, value);
    }

    /// Word at PC, split into fields.
    pub fn current_instruction(&self) -> InstructionWord {
        InstructionWord::from(self.mem.read(self.regs.program_counter()))
    }

    /// Length in words of the instruction at PC.
    pub fn current_instruction_length(&self) -> Word {
        self.current_instruction().length(&self.operands)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: u8) -> OperandCode {
        OperandCode::try_from(raw).unwrap()
    }

    #[test]
    fn test_operand_round_trip_through_cpu() {
        let mut cpu = Cpu::new();
        cpu.regs.set_register(1, 0x3000);

        cpu.write_operand(code(0x09), 0x1234);
        assert_eq!(cpu.mem.read(0x3000), 0x1234);
        assert_eq!(cpu.read_operand(code(0x09)), 0x1234);
    }

    #[test]
    fn test_stack_through_cpu() {
        let mut cpu = Cpu::new();

        // Power-on SP is 0: the first push reserves 0xFFFF
        cpu.read_operand(OperandCode::PUSH);
        assert_eq!(cpu.regs.stack_pointer(), 0xFFFF);
        cpu.mem.write(cpu.regs.stack_pointer(), 0xABCD);

        assert_eq!(cpu.read_operand(OperandCode::PEEK), 0xABCD);
        assert_eq!(cpu.read_operand(OperandCode::POP), 0xABCD);
        assert_eq!(cpu.regs.stack_pointer(), 0x0000);
    }

    #[test]
    fn test_dispatch_style_step() {
        let mut cpu = Cpu::new();
        // SET [0x1000+A], 0x20 (next word)
        let word = InstructionWord::encode(0x1, code(0x10), OperandCode::NEXT_WORD);
        cpu.load_program(&[word.raw(), 0x1000, 0x0020]).unwrap();
        cpu.regs.set_register(0, 4);

        assert_eq!(cpu.current_instruction_length(), 3);

        // The dispatch loop reads b with PC moved past a's next word.
        let instr = cpu.current_instruction();
        let b_pc = cpu.regs.program_counter() + cpu.operand(instr.a()).size();
        cpu.regs.set_program_counter(b_pc);
        let value = cpu.read_operand(instr.b());
        cpu.regs.set_program_counter(0);
        cpu.write_operand(instr.a(), value);

        assert_eq!(cpu.mem.read(0x1004), 0x0020);
    }

    #[test]
    fn test_reset() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[1, 2, 3]).unwrap();
        cpu.regs.set_overflow(1);

        cpu.reset();
        assert_eq!(cpu.regs, Registers::new());
        assert_eq!(cpu.mem, Memory::new());
    }
}
