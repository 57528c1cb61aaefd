use crate::constant::{
    CODE_REGION_END, CODE_REGION_START, DATA_REGION_END, DATA_REGION_START, MAX_CODE_INSTRUCTIONS,
    MAX_DATA_BYTES, MEMORY_SIZE, PROGRAM_EXTENSION,
};
use crate::data::{LoadError, LoadErrorCode, Program};
use crate::memory::SystemMemory;
use crate::parser::parse_program;
use crate::tokenizer::{tokenize, Source, TokenCursor};
use crate::{verbose_println, very_verbose_println, very_very_verbose_println};
use std::path::Path;

/// Entry point for the execution engine: loads `filename` into `memory` and
/// reports bare success or failure. On failure memory may have been left
/// partially written; the engine must not run it.
pub fn load(memory: &mut SystemMemory, filename: &str) -> bool {
    match try_load(memory, filename) {
        Ok(program) => {
            verbose_println!("loaded a valid program into memory {program}");
            true
        }
        Err(err) => {
            println!("{err}");
            false
        }
    }
}

/// Runs the whole pipeline (file guards, tokenizer, section parser,
/// validator, memory writes), stopping at the first failure. Returns the
/// parsed program so callers can report what was placed where.
pub fn try_load(memory: &mut SystemMemory, filename: &str) -> Result<Program, LoadError> {
    validate_file_type(filename)?;
    verbose_println!("loading program from file [ {filename} ]");
    let source = Source::read(filename)?;
    let tokens = tokenize(&source);
    if tokens.is_empty() {
        return Err(LoadError::new(
            LoadErrorCode::EmptyProgram,
            format!("no tokens found in [ {filename} ]"),
        ));
    }
    very_verbose_println!("tokenized [ {filename} ] into {} tokens", tokens.len());
    let mut cursor = TokenCursor::new(tokens);
    let program = parse_program(&source, &mut cursor)?;
    very_verbose_println!("parsed program {program}");
    verify_program(&program)?;
    load_program_into_memory(memory, &program)?;
    Ok(program)
}

fn validate_file_type(filename: &str) -> Result<(), LoadError> {
    let path = Path::new(filename);
    if !path.exists() {
        return Err(LoadError::new(
            LoadErrorCode::SourceFileError,
            format!("file [ {filename} ] does not exist"),
        ));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(PROGRAM_EXTENSION) {
        return Err(LoadError::new(
            LoadErrorCode::InvalidFileType,
            format!("file [ {filename} ] is not a .{PROGRAM_EXTENSION} file"),
        ));
    }
    Ok(())
}

/// All-or-nothing range checks on a parsed program. Keeping data in
/// `[0x8000, 0xF000)` and code in `[0x1000, 0x8000)` is what guarantees the
/// two images never overlap; the capacity checks keep every write inside the
/// 64KB address space.
pub fn verify_program(program: &Program) -> Result<(), LoadError> {
    let data_start = program.data.starting_address;
    if !(DATA_REGION_START..DATA_REGION_END).contains(&data_start) {
        return Err(LoadError::new(
            LoadErrorCode::SectionOutOfRange,
            format!(
                "data section starting address {data_start:#06x} outside \
                 [{DATA_REGION_START:#06x}, {DATA_REGION_END:#06x})"
            ),
        ));
    }
    if program.data.bytes.len() >= MAX_DATA_BYTES {
        return Err(LoadError::new(
            LoadErrorCode::SectionTooLarge,
            format!(
                "data section holds {} bytes, limit is {MAX_DATA_BYTES}",
                program.data.bytes.len()
            ),
        ));
    }
    let code_start = program.code.starting_address;
    if !(CODE_REGION_START..CODE_REGION_END).contains(&code_start) {
        return Err(LoadError::new(
            LoadErrorCode::SectionOutOfRange,
            format!(
                "code section starting address {code_start:#06x} outside \
                 [{CODE_REGION_START:#06x}, {CODE_REGION_END:#06x})"
            ),
        ));
    }
    if program.code.instructions.len() >= MAX_CODE_INSTRUCTIONS {
        return Err(LoadError::new(
            LoadErrorCode::SectionTooLarge,
            format!(
                "code section holds {} instructions, limit is {MAX_CODE_INSTRUCTIONS}",
                program.code.instructions.len()
            ),
        ));
    }
    if data_start as usize + program.data.bytes.len() > MEMORY_SIZE {
        return Err(LoadError::new(
            LoadErrorCode::ImageOverflow,
            format!(
                "data section of {} bytes at {data_start:#06x} runs past the end of memory",
                program.data.bytes.len()
            ),
        ));
    }
    if code_start as usize + program.code.encoded_len() > MEMORY_SIZE {
        return Err(LoadError::new(
            LoadErrorCode::ImageOverflow,
            format!(
                "code section of {} bytes at {code_start:#06x} runs past the end of memory",
                program.code.encoded_len()
            ),
        ));
    }
    Ok(())
}

fn load_program_into_memory(
    memory: &mut SystemMemory,
    program: &Program,
) -> Result<(), LoadError> {
    memory.write_slice(program.data.starting_address, &program.data.bytes)?;
    let condensed = program.code.condense();
    memory.write_slice(program.code.starting_address, &condensed)?;
    for instruction in &program.code.instructions {
        very_very_verbose_println!("placed instruction {instruction}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CodeSection, DataSection};
    use crate::instruction::{Instruction, Opcode};

    fn program(data_start: u16, data_len: usize, code_start: u16) -> Program {
        Program {
            data: DataSection {
                starting_address: data_start,
                bytes: vec![0xAA; data_len],
            },
            code: CodeSection {
                starting_address: code_start,
                instructions: vec![
                    Instruction::NoOperand(Opcode::NOP),
                    Instruction::NoOperand(Opcode::HLT),
                ],
            },
        }
    }

    #[test]
    fn accepts_sections_inside_their_regions() {
        assert!(verify_program(&program(0x8000, 4, 0x1000)).is_ok());
        assert!(verify_program(&program(0xEFFF, 1, 0x7FFF)).is_ok());
    }

    #[test]
    fn rejects_data_addresses_outside_the_data_region() {
        let err = verify_program(&program(0x7FFF, 1, 0x1000)).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SectionOutOfRange);
        let err = verify_program(&program(0xF000, 1, 0x1000)).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SectionOutOfRange);
    }

    #[test]
    fn rejects_code_addresses_outside_the_code_region() {
        let err = verify_program(&program(0x8000, 1, 0x0FFF)).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SectionOutOfRange);
        let err = verify_program(&program(0x8000, 1, 0x8000)).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SectionOutOfRange);
    }

    #[test]
    fn rejects_oversized_data_sections() {
        let err = verify_program(&program(0x8000, MAX_DATA_BYTES, 0x1000)).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SectionTooLarge);
        assert!(verify_program(&program(0x8000, MAX_DATA_BYTES - 1, 0x1000)).is_ok());
    }

    #[test]
    fn rejects_oversized_code_sections() {
        let mut oversized = program(0x8000, 1, 0x1000);
        oversized.code.instructions =
            vec![Instruction::NoOperand(Opcode::NOP); MAX_CODE_INSTRUCTIONS];
        let err = verify_program(&oversized).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SectionTooLarge);
    }

    #[test]
    fn rejects_data_that_would_run_past_memory() {
        let err = verify_program(&program(0xEFFF, 0x2000, 0x1000)).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::ImageOverflow);
    }

    #[test]
    fn rejects_code_that_would_run_past_memory() {
        let mut long_code = program(0x8000, 1, 0x7FFF);
        long_code.code.instructions = vec![
            Instruction::TwoOperand(Opcode::JMP, 0x00, 0x10);
            (MEMORY_SIZE - 0x7FFF) / 3 + 1
        ];
        let err = verify_program(&long_code).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::ImageOverflow);
    }

    #[test]
    fn loads_both_sections_at_their_addresses() {
        let mut memory = SystemMemory::new();
        let program = Program {
            data: DataSection {
                starting_address: 0x8000,
                bytes: vec![0x10, 0x20],
            },
            code: CodeSection {
                starting_address: 0x1000,
                instructions: vec![
                    Instruction::OneOperand(Opcode::MVI_B, 0x05),
                    Instruction::NoOperand(Opcode::HLT),
                ],
            },
        };
        verify_program(&program).unwrap();
        load_program_into_memory(&mut memory, &program).unwrap();
        assert_eq!(memory.read(0x8000), 0x10);
        assert_eq!(memory.read(0x8001), 0x20);
        assert_eq!(memory.read(0x1000), 0x06);
        assert_eq!(memory.read(0x1001), 0x05);
        assert_eq!(memory.read(0x1002), 0x76);
    }

    #[test]
    fn missing_files_are_refused_before_parsing() {
        let err = validate_file_type("no/such/file.program").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::SourceFileError);
    }
}
