//! DCPU-16 Emulator - CLI Entry Point
//!
//! Commands:
//! - `dcpu16-emu table` - List the 64 operand addressing modes
//! - `dcpu16-emu fields <word>` - Split an instruction word into its fields
//! - `dcpu16-emu eval <code>` - Read or write one operand against CPU state
//! - `dcpu16-emu test` - Built-in self-test

use clap::{Parser, Subcommand};
use dcpu16::cpu::registers::REGISTER_NAMES;
use dcpu16::{Cpu, InstructionWord, OperandCode, OperandTable, Word};

#[derive(Parser)]
#[command(name = "dcpu16-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "Operand addressing-mode decoder for a DCPU-16 emulator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every operand code with its addressing mode
    Table,
    /// Split an instruction word into opcode and operand fields
    Fields {
        /// Instruction word (hex, e.g. 7c01)
        #[arg(value_parser = parse_word)]
        word: Word,
    },
    /// Read (or write, then read back) one operand against CPU state
    Eval {
        /// Operand code (hex, 00-3f)
        #[arg(value_parser = parse_code)]
        code: OperandCode,
        /// Program image loaded at address 0
        #[arg(short, long)]
        image: Option<String>,
        /// JSON snapshot to start from
        #[arg(short, long, conflicts_with = "image")]
        snapshot: Option<String>,
        /// Program counter (hex)
        #[arg(long, value_parser = parse_word)]
        pc: Option<Word>,
        /// Stack pointer (hex)
        #[arg(long, value_parser = parse_word)]
        sp: Option<Word>,
        /// General register assignment, e.g. A=1000 (repeatable)
        #[arg(short, long, value_parser = parse_register)]
        reg: Vec<(usize, Word)>,
        /// Write this value (hex) through the operand before reading
        #[arg(short, long, value_parser = parse_word)]
        write: Option<Word>,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Table) => print_table(),
        Some(Commands::Fields { word }) => print_fields(word),
        Some(Commands::Eval { code, image, snapshot, pc, sp, reg, write }) => {
            let mut cpu = match build_cpu(image.as_deref(), snapshot.as_deref()) {
                Ok(cpu) => cpu,
                Err(e) => {
                    eprintln!("❌ Failed to prepare CPU: {}", e);
                    std::process::exit(1);
                }
            };
            if let Some(pc) = pc {
                cpu.regs.set_program_counter(pc);
            }
            if let Some(sp) = sp {
                cpu.regs.set_stack_pointer(sp);
            }
            for (index, value) in reg {
                cpu.regs.set_register(index, value);
            }
            eval_operand(&mut cpu, code, write);
        }
        Some(Commands::Test) => run_self_test(),
        None => {
            println!("DCPU-16 Emulator v0.1.0");
            println!("Operand addressing-mode decoder");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn parse_word(s: &str) -> Result<Word, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    Word::from_str_radix(digits, 16).map_err(|e| format!("invalid word '{}': {}", s, e))
}

fn parse_code(s: &str) -> Result<OperandCode, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let raw = u8::from_str_radix(digits, 16).map_err(|e| format!("invalid code '{}': {}", s, e))?;
    OperandCode::try_from(raw).map_err(|e| e.to_string())
}

fn parse_register(s: &str) -> Result<(usize, Word), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let index = REGISTER_NAMES
        .iter()
        .position(|r| r.eq_ignore_ascii_case(name))
        .ok_or_else(|| format!("unknown register '{}'", name))?;
    Ok((index, parse_word(value)?))
}

fn build_cpu(image: Option<&str>, snapshot: Option<&str>) -> Result<Cpu, dcpu16::ImageError> {
    if let Some(path) = snapshot {
        return Ok(dcpu16::load_snapshot(path)?.restore());
    }

    let mut cpu = Cpu::new();
    if let Some(path) = image {
        let program = dcpu16::load_image(path)?;
        cpu.load_program(&program.words)?;
        println!("📂 Loaded {} words", program.len());
    }
    Ok(cpu)
}

fn print_table() {
    let table = OperandTable::new();

    println!("code  operand    size  writable  type");
    for operand in table.iter() {
        println!(
            "{}  {:<9}  {:>4}  {:<8}  {}",
            operand.code(),
            operand.to_string(),
            operand.size(),
            if operand.is_writable() { "yes" } else { "no" },
            operand.type_tag(),
        );
    }
}

fn print_fields(word: Word) {
    let table = OperandTable::new();
    let instr = InstructionWord::from(word);
    let a = table.get(instr.a());
    let b = table.get(instr.b());

    println!("word:   {}", instr);
    println!("opcode: {:#x}", instr.opcode());
    println!("a:      {} {} ({}, size {})", a.code(), a, a.type_tag(), a.size());
    println!("b:      {} {} ({}, size {})", b.code(), b, b.type_tag(), b.size());
    println!("length: {} word(s)", instr.length(&table));
}

fn eval_operand(cpu: &mut Cpu, code: OperandCode, write: Option<Word>) {
    let operand = *cpu.operand(code);
    println!("operand: {} {} ({})", code, operand, operand.type_tag());
    if let Some(addr) = operand.effective_address(&cpu.regs, &cpu.mem) {
        println!("address: {:#06x}", addr);
    }

    if let Some(value) = write {
        if !operand.is_writable() {
            println!("⚠️  {} is not writable; write ignored", operand.type_tag());
        }
        cpu.write_operand(code, value);
    }
    let value = cpu.read_operand(code);

    println!();
    println!("━━━ Result ━━━");
    println!("value: {:#06x} ({})", value, value);
    println!("size:  {}", operand.size());
    println!("SP={:#06x} PC={:#06x} O={:#06x}",
        cpu.regs.stack_pointer(), cpu.regs.program_counter(), cpu.regs.overflow());
    for (i, name) in REGISTER_NAMES.iter().enumerate() {
        print!("{}={:#06x} ", name, cpu.regs.register(i));
    }
    println!();
}

fn run_self_test() {
    println!("━━━ DCPU-16 Operand Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        print!("{}... ", name);
        if ok { println!("✓"); passed += 1; }
        else { println!("✗"); failed += 1; }
    };

    let table = OperandTable::new();
    let code = |raw: u8| OperandCode::from_field(raw as Word);

    // Test 1: Table totality
    check(
        "Operand table covers all 64 codes",
        table.iter().enumerate().all(|(i, op)| op.code().index() == i),
    );

    // Test 2: Literals
    let mut cpu = Cpu::new();
    check(
        "Literal codes read 0x00-0x1f",
        (0x20..=0x3Fu8).all(|raw| cpu.read_operand(code(raw)) == (raw - 0x20) as Word),
    );

    // Test 3: Indirect register
    let mut cpu = Cpu::new();
    cpu.regs.set_register(2, 0x1000);
    cpu.mem.write(0x1000, 7);
    let before = cpu.read_operand(code(0x0A));
    cpu.write_operand(code(0x0A), 9);
    check("Indirect register read/write", before == 7 && cpu.read_operand(code(0x0A)) == 9);

    // Test 4: Stack ordering
    let mut cpu = Cpu::new();
    cpu.regs.set_stack_pointer(0xFFFF);
    cpu.mem.write(0xFFFE, 0x42);
    let pushed = cpu.read_operand(OperandCode::PUSH);
    let sp_after_push = cpu.regs.stack_pointer();
    let popped = cpu.read_operand(OperandCode::POP);
    check(
        "PUSH then POP restores SP",
        pushed == 0x42 && sp_after_push == 0xFFFE && popped == 0x42 && cpu.regs.stack_pointer() == 0xFFFF,
    );

    // Test 5: Next word modes
    let mut cpu = Cpu::new();
    cpu.regs.set_program_counter(0x100);
    cpu.mem.write(0x101, 0x55);
    cpu.mem.write(0x55, 0x99);
    check(
        "Next word and next word indirect",
        cpu.read_operand(OperandCode::NEXT_WORD) == 0x55
            && cpu.read_operand(OperandCode::NEXT_WORD_INDIRECT) == 0x99
            && cpu.operand(OperandCode::NEXT_WORD).size() == 1,
    );

    // Test 6: Indexed next word
    let mut cpu = Cpu::new();
    cpu.regs.set_program_counter(0x200);
    cpu.mem.write(0x201, 0x10);
    cpu.regs.set_register(0, 0x05);
    cpu.write_operand(code(0x10), 0x77);
    check("[next word + register] addressing", cpu.mem.read(0x15) == 0x77);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
