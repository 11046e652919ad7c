//! Program images and machine snapshots.
//!
//! A program image is a simple text format:
//! - Hexadecimal words separated by whitespace, optionally `0x` prefixed
//! - `;` starts a comment that runs to the end of the line
//! - Blank lines are ignored
//!
//! A snapshot is JSON holding the register file and the non-zero memory
//! cells, used to position a CPU before inspecting operands.

use crate::cpu::{Cpu, Memory, MemoryError, Registers, Word};
use serde::{Serialize, Deserialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// A loaded program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    /// Program words, loaded from address 0.
    pub words: Vec<Word>,
}

impl ProgramImage {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Parse program image text.
pub fn parse_image(source: &str) -> Result<ProgramImage, ImageError> {
    let mut image = ProgramImage::default();

    for (line_num, line) in source.lines().enumerate() {
        let code = line.split(';').next().unwrap_or("");

        for token in code.split_whitespace() {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            let word = Word::from_str_radix(digits, 16).map_err(|e| ImageError::Parse {
                line: line_num + 1,
                message: format!("invalid word '{}': {}", token, e),
            })?;
            image.words.push(word);
        }
    }

    Ok(image)
}

/// Load a program image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, ImageError> {
    let source = std::fs::read_to_string(path.as_ref())?;
    let image = parse_image(&source)?;
    log::debug!("parsed {} words from {}", image.len(), path.as_ref().display());
    Ok(image)
}

/// Save a program image to disk, eight words per line.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ProgramImage) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())?;

    writeln!(file, "; DCPU-16 program image")?;
    writeln!(file, "; {} words", image.len())?;

    for (i, chunk) in image.words.chunks(8).enumerate() {
        let line: Vec<String> = chunk.iter().map(|w| format!("{:04x}", w)).collect();
        writeln!(file, "{} ; {:04x}", line.join(" "), i * 8)?;
    }

    Ok(())
}

/// Register file plus sparse memory contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: Registers,
    /// `(address, value)` pairs for every non-zero cell.
    #[serde(default)]
    pub memory: Vec<(Word, Word)>,
}

impl Snapshot {
    /// Capture the state of a CPU.
    pub fn capture(cpu: &Cpu) -> Self {
        Self {
            registers: cpu.regs.clone(),
            memory: cpu.mem.non_zero_cells(),
        }
    }

    /// Build a fresh CPU holding this state.
    pub fn restore(&self) -> Cpu {
        let mut mem = Memory::new();
        for &(addr, value) in &self.memory {
            mem.write(addr, value);
        }
        log::debug!("restored snapshot with {} memory cells", self.memory.len());
        Cpu::from_parts(self.registers.clone(), mem)
    }
}

/// Load a JSON snapshot from disk.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, ImageError> {
    let source = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&source)?)
}

/// Save a JSON snapshot to disk.
pub fn save_snapshot<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), ImageError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Errors that can occur while loading images and snapshots.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}
