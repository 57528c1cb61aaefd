use crate::constant::{Address, DATA_REGION_START, NAME};
use crate::instruction::Instruction;
use colorize::AnsiColor;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorCode {
    SourceFileError,
    InvalidFileType,
    EmptyProgram,
    UnexpectedEndOfProgram,
    MissingSectionMarker,
    MalformedNumeral,
    NumeralOutOfRange,
    UnrecognizedMnemonic,
    MissingHaltInstruction,
    SectionOutOfRange,
    SectionTooLarge,
    ImageOverflow,
    CliArgError,
    OutputWriteError,
}

#[derive(Debug)]
pub struct LoadError {
    pub code: LoadErrorCode,
    pub reason: String,
    pub trace: Option<String>,
}

impl LoadError {
    pub fn new(code: LoadErrorCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            trace: None,
        }
    }

    /// Points the error back into the program source: the offending line
    /// echoed with a caret/squiggle highlight.
    pub fn with_trace(mut self, trace: String) -> Self {
        self.trace = Some(trace);
        self
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{NAME}: {} {} :: {}",
            "error:".red(),
            format!("{:?}", self.code).yellow(),
            self.reason
        )?;
        if let Some(trace) = &self.trace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

/// Raw bytes destined for the high-memory data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSection {
    pub starting_address: Address,
    pub bytes: Vec<u8>,
}

impl Default for DataSection {
    // An absent data section still has to satisfy the address-range
    // predicate, so the default start sits at the bottom of the data region.
    fn default() -> Self {
        Self {
            starting_address: DATA_REGION_START,
            bytes: Vec::new(),
        }
    }
}

/// Parsed instructions destined for the low-memory code region. The parser
/// guarantees the sequence is non-empty and ends with the halt instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSection {
    pub starting_address: Address,
    pub instructions: Vec<Instruction>,
}

impl CodeSection {
    /// Total byte length of the condensed instruction stream.
    pub fn encoded_len(&self) -> usize {
        self.instructions
            .iter()
            .map(|instruction| instruction.encoded_len())
            .sum()
    }

    /// Flattens the instruction sequence into the byte image written to
    /// memory: each instruction contributes its opcode byte followed by
    /// exactly the operand bytes it carries.
    pub fn condense(&self) -> Vec<u8> {
        let mut image = Vec::with_capacity(self.encoded_len());
        for instruction in &self.instructions {
            instruction.condense_into(&mut image);
        }
        image
    }
}

/// A fully parsed program file. Exists only between a successful parse and
/// the load into memory; it is never constructed partially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub data: DataSection,
    pub code: CodeSection,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ data @ {:#06x} ({} bytes) | code @ {:#06x} ({} instructions, {} bytes) ]",
            self.data.starting_address,
            self.data.bytes.len(),
            self.code.starting_address,
            self.code.instructions.len(),
            self.code.encoded_len(),
        )
    }
}
