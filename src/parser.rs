use crate::constant::{
    BINARY, CODE_BEGIN_MARKER, CODE_END_MARKER, DATA_BEGIN_MARKER, DATA_END_MARKER, HEX, OCTAL,
    OPERAND_SEPARATOR,
};
use crate::data::{CodeSection, DataSection, LoadError, LoadErrorCode, Program};
use crate::instruction::{Instruction, Opcode};
use crate::tokenizer::{Source, Token, TokenCursor};
use crate::{very_verbose_println, very_very_verbose_println};

/// Consumes the whole token stream into a `Program`: an optional data
/// section followed by the mandatory code section. Tokens remaining after
/// the code section closer are ignored.
pub fn parse_program(source: &Source, cursor: &mut TokenCursor) -> Result<Program, LoadError> {
    let data = parse_data_section(source, cursor)?;
    let code = parse_code_section(source, cursor)?;
    if !cursor.is_exhausted() {
        very_verbose_println!("{} tokens remain after [ {CODE_END_MARKER} ]", cursor.remaining());
    }
    Ok(Program { data, code })
}

fn parse_data_section(source: &Source, cursor: &mut TokenCursor) -> Result<DataSection, LoadError> {
    match cursor.peek() {
        Some(token) if token.as_str() == DATA_BEGIN_MARKER => {}
        _ => {
            very_verbose_println!("no data section, skipping ahead to the code section");
            return Ok(DataSection::default());
        }
    }
    cursor.next();
    let starting_address = consume_address(source, cursor, "data section starting address")?;
    let length = consume_numeral(source, cursor, u16::MAX as u32, "data section length")?;
    let mut bytes = Vec::with_capacity(length as usize);
    for _ in 0..length {
        bytes.push(consume_byte(source, cursor, "data byte")?);
    }
    expect_marker(source, cursor, DATA_END_MARKER)?;
    very_verbose_println!(
        "data section: {} bytes starting at {starting_address:#06x}",
        bytes.len()
    );
    Ok(DataSection {
        starting_address,
        bytes,
    })
}

fn parse_code_section(source: &Source, cursor: &mut TokenCursor) -> Result<CodeSection, LoadError> {
    match cursor.next() {
        Some(token) if token.as_str() == CODE_BEGIN_MARKER => {}
        Some(token) => {
            return Err(LoadError::new(
                LoadErrorCode::MissingSectionMarker,
                format!(
                    "expected [ {CODE_BEGIN_MARKER} ], found [ {} ] :: no program to execute",
                    token.as_str()
                ),
            )
            .with_trace(source.traceback(token)))
        }
        None => {
            return Err(LoadError::new(
                LoadErrorCode::UnexpectedEndOfProgram,
                format!("expected [ {CODE_BEGIN_MARKER} ] before the end of the program"),
            ))
        }
    }
    let starting_address = consume_address(source, cursor, "code section starting address")?;
    let mut instructions = Vec::new();
    while let Some(token) = cursor.peek() {
        if is_halt_token(token.as_str()) {
            break;
        }
        instructions.push(parse_instruction(source, cursor)?);
    }
    // the first halt token ends instruction consumption; exactly one more
    // instruction (the halt itself) is admitted
    match cursor.peek() {
        Some(token) if is_halt_token(token.as_str()) => {}
        _ => {
            return Err(LoadError::new(
                LoadErrorCode::MissingHaltInstruction,
                "expected a halt instruction at the end of the program",
            ))
        }
    }
    instructions.push(parse_instruction(source, cursor)?);
    expect_marker(source, cursor, CODE_END_MARKER)?;
    very_verbose_println!(
        "code section: {} instructions starting at {starting_address:#06x}",
        instructions.len()
    );
    Ok(CodeSection {
        starting_address,
        instructions,
    })
}

/// Resolves one instruction token of the form `MNEMONIC[,OP1[,OP2]]`. The
/// mnemonic is cut at the first comma and the second operand at the last
/// comma, so at most two operand fields ever come out.
fn parse_instruction(source: &Source, cursor: &mut TokenCursor) -> Result<Instruction, LoadError> {
    let token = match cursor.next() {
        Some(token) => token,
        None => {
            return Err(LoadError::new(
                LoadErrorCode::UnexpectedEndOfProgram,
                "ran out of tokens while reading an instruction",
            ))
        }
    };
    let text = token.as_str();
    let (mnemonic, operand_text) = match text.split_once(OPERAND_SEPARATOR) {
        Some((mnemonic, rest)) => (mnemonic, Some(rest)),
        None => (text, None),
    };
    let opcode = match Opcode::from_mnemonic(mnemonic) {
        Some(opcode) => opcode,
        None => {
            return Err(LoadError::new(
                LoadErrorCode::UnrecognizedMnemonic,
                format!("[ {mnemonic} ] is not a valid operation"),
            )
            .with_trace(source.traceback(token)))
        }
    };
    let (operand1_text, operand2_text) = match operand_text {
        Some(rest) => match rest.rsplit_once(OPERAND_SEPARATOR) {
            Some((first, second)) => (Some(first), Some(second)),
            None => (Some(rest), None),
        },
        None => (None, None),
    };
    // an empty operand field counts as absent
    let mut operands = Vec::new();
    for operand in [operand1_text, operand2_text].into_iter().flatten() {
        if operand.is_empty() {
            continue;
        }
        operands.push(parse_operand(source, token, operand)?);
    }
    let instruction = match operands[..] {
        [] => Instruction::NoOperand(opcode),
        [operand1] => Instruction::OneOperand(opcode, operand1),
        [operand1, operand2] => Instruction::TwoOperand(opcode, operand1, operand2),
        _ => unreachable!("the two comma splits produce at most two operands"),
    };
    very_very_verbose_println!("built instruction {instruction}");
    Ok(instruction)
}

fn parse_operand(source: &Source, token: &Token, text: &str) -> Result<u8, LoadError> {
    let value = match parse_numeral(text) {
        Some(value) => value,
        None => {
            return Err(LoadError::new(
                LoadErrorCode::MalformedNumeral,
                format!("operand [ {text} ] is not a valid numeral"),
            )
            .with_trace(source.traceback(token)))
        }
    };
    if value > u8::MAX as u32 {
        return Err(LoadError::new(
            LoadErrorCode::NumeralOutOfRange,
            format!("operand [ {text} ] (value {value:#x}) does not fit in one byte"),
        )
        .with_trace(source.traceback(token)));
    }
    Ok(value as u8)
}

// Halt detection keys on the whole token equalling the halt mnemonic; a
// token like `HLT,0x05` is an ordinary instruction, not a terminator.
fn is_halt_token(text: &str) -> bool {
    Opcode::from_mnemonic(text) == Some(Opcode::HLT)
}

fn expect_marker(source: &Source, cursor: &mut TokenCursor, marker: &str) -> Result<(), LoadError> {
    match cursor.next() {
        Some(token) if token.as_str() == marker => Ok(()),
        Some(token) => Err(LoadError::new(
            LoadErrorCode::MissingSectionMarker,
            format!("expected [ {marker} ], found [ {} ]", token.as_str()),
        )
        .with_trace(source.traceback(token))),
        None => Err(LoadError::new(
            LoadErrorCode::UnexpectedEndOfProgram,
            format!("expected [ {marker} ] before the end of the program"),
        )),
    }
}

fn consume_address(
    source: &Source,
    cursor: &mut TokenCursor,
    what: &str,
) -> Result<u16, LoadError> {
    consume_numeral(source, cursor, u16::MAX as u32, what).map(|value| value as u16)
}

fn consume_byte(source: &Source, cursor: &mut TokenCursor, what: &str) -> Result<u8, LoadError> {
    consume_numeral(source, cursor, u8::MAX as u32, what).map(|value| value as u8)
}

fn consume_numeral(
    source: &Source,
    cursor: &mut TokenCursor,
    limit: u32,
    what: &str,
) -> Result<u32, LoadError> {
    let token = match cursor.next() {
        Some(token) => token,
        None => {
            return Err(LoadError::new(
                LoadErrorCode::UnexpectedEndOfProgram,
                format!("ran out of tokens while reading {what}"),
            ))
        }
    };
    let value = match parse_numeral(token.as_str()) {
        Some(value) => value,
        None => {
            return Err(LoadError::new(
                LoadErrorCode::MalformedNumeral,
                format!("{what} [ {} ] is not a valid numeral", token.as_str()),
            )
            .with_trace(source.traceback(token)))
        }
    };
    if value > limit {
        return Err(LoadError::new(
            LoadErrorCode::NumeralOutOfRange,
            format!(
                "{what} [ {} ] (value {value:#x}) exceeds the field maximum {limit:#x}",
                token.as_str()
            ),
        )
        .with_trace(source.traceback(token)));
    }
    Ok(value)
}

fn parse_numeral(text: &str) -> Option<u32> {
    if let Some(digits) = text.strip_prefix(HEX).or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(digits, 16).ok()
    } else if let Some(digits) = text.strip_prefix(BINARY).or_else(|| text.strip_prefix("0B")) {
        u32::from_str_radix(digits, 2).ok()
    } else if let Some(digits) = text.strip_prefix(OCTAL).or_else(|| text.strip_prefix("0O")) {
        u32::from_str_radix(digits, 8).ok()
    } else {
        text.parse::<u32>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_text(text: &str) -> Result<Program, LoadError> {
        let source = Source::new("test.program", text);
        let mut cursor = TokenCursor::new(tokenize(&source));
        parse_program(&source, &mut cursor)
    }

    #[test]
    fn code_only_program_gets_an_empty_data_section() {
        let program = parse_text("code_begin 0x1000 NOP HLT code_end").unwrap();
        assert!(program.data.bytes.is_empty());
        assert_eq!(program.code.starting_address, 0x1000);
        assert_eq!(
            program.code.instructions,
            vec![
                Instruction::NoOperand(Opcode::NOP),
                Instruction::NoOperand(Opcode::HLT),
            ]
        );
    }

    #[test]
    fn data_and_code_sections_parse_together() {
        let program = parse_text(
            "data_begin 0x8000 2 0x10 0x20 data_end\ncode_begin 0x1000 MVI_B,0x05 HLT code_end",
        )
        .unwrap();
        assert_eq!(program.data.starting_address, 0x8000);
        assert_eq!(program.data.bytes, vec![0x10, 0x20]);
        assert_eq!(
            program.code.instructions,
            vec![
                Instruction::OneOperand(Opcode::MVI_B, 0x05),
                Instruction::NoOperand(Opcode::HLT),
            ]
        );
    }

    #[test]
    fn accepted_code_sections_end_with_the_halt_opcode() {
        let program = parse_text("code_begin 0x1000 NOP MVI_B,0x05 HLT code_end").unwrap();
        assert_eq!(
            program.code.instructions.last().map(|i| i.opcode()),
            Some(Opcode::HLT)
        );
    }

    #[test]
    fn halt_alone_is_a_valid_code_section() {
        let program = parse_text("code_begin 0x1000 HLT code_end").unwrap();
        assert_eq!(
            program.code.instructions,
            vec![Instruction::NoOperand(Opcode::HLT)]
        );
    }

    #[test]
    fn two_operand_instructions_split_on_both_commas() {
        let program = parse_text("code_begin 0x1000 LXI_H,0x34,0x12 HLT code_end").unwrap();
        assert_eq!(
            program.code.instructions[0],
            Instruction::TwoOperand(Opcode::LXI_H, 0x34, 0x12)
        );
    }

    #[test]
    fn numerals_accept_prefixed_bases() {
        let program = parse_text(
            "data_begin 0x8000 4 0b1010 0o17 255 0xFF data_end\ncode_begin 4096 HLT code_end",
        )
        .unwrap();
        assert_eq!(program.data.bytes, vec![0b1010, 0o17, 255, 0xFF]);
        assert_eq!(program.code.starting_address, 0x1000);
    }

    #[test]
    fn empty_operand_fields_count_as_absent() {
        let program = parse_text("code_begin 0x1000 MVI_B, HLT code_end").unwrap();
        assert_eq!(
            program.code.instructions[0],
            Instruction::NoOperand(Opcode::MVI_B)
        );
        let program = parse_text("code_begin 0x1000 MVI_B,,0x05 HLT code_end").unwrap();
        assert_eq!(
            program.code.instructions[0],
            Instruction::OneOperand(Opcode::MVI_B, 0x05)
        );
    }

    #[test]
    fn three_operand_fields_fail_as_a_malformed_numeral() {
        let err = parse_text("code_begin 0x1000 MVI_B,1,2,3 HLT code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MalformedNumeral);
    }

    #[test]
    fn unknown_mnemonic_rejects_the_program() {
        let err = parse_text("code_begin 0x1000 NOP FOOBAR HLT code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::UnrecognizedMnemonic);
    }

    #[test]
    fn operand_boundary_is_one_byte() {
        let program = parse_text("code_begin 0x1000 ADI,255 HLT code_end").unwrap();
        assert_eq!(
            program.code.instructions[0],
            Instruction::OneOperand(Opcode::ADI, 255)
        );
        let err = parse_text("code_begin 0x1000 ADI,256 HLT code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::NumeralOutOfRange);
        let err = parse_text("code_begin 0x1000 ADI,0x100 HLT code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::NumeralOutOfRange);
    }

    #[test]
    fn address_numerals_are_sixteen_bit() {
        let err = parse_text("code_begin 0x10000 HLT code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::NumeralOutOfRange);
    }

    #[test]
    fn malformed_numerals_are_rejected() {
        let err = parse_text("code_begin 0x1000 ADI,12g4 HLT code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MalformedNumeral);
        let err = parse_text("data_begin 0x8000 1 0x data_end\ncode_begin 0x1000 HLT code_end")
            .unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MalformedNumeral);
    }

    #[test]
    fn missing_halt_at_end_of_tokens_is_reported() {
        let err = parse_text("code_begin 0x1000 NOP").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MissingHaltInstruction);
    }

    #[test]
    fn closer_without_halt_fails_mnemonic_lookup() {
        let err = parse_text("code_begin 0x1000 NOP code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::UnrecognizedMnemonic);
    }

    #[test]
    fn instructions_after_the_halt_break_the_section() {
        let err = parse_text("code_begin 0x1000 NOP HLT NOP code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MissingSectionMarker);
    }

    #[test]
    fn halt_with_operands_is_not_a_terminator() {
        let err = parse_text("code_begin 0x1000 NOP HLT,0x05 code_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::UnrecognizedMnemonic);
    }

    #[test]
    fn missing_code_section_is_reported() {
        let err =
            parse_text("data_begin 0x8000 1 0x10 data_end").unwrap_err();
        assert_eq!(err.code, LoadErrorCode::UnexpectedEndOfProgram);
    }

    #[test]
    fn missing_data_end_is_reported() {
        let err = parse_text("data_begin 0x8000 1 0x10 code_begin 0x1000 HLT code_end")
            .unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MissingSectionMarker);
    }

    #[test]
    fn short_data_block_consumes_the_closer_and_fails() {
        let err = parse_text("data_begin 0x8000 2 0x10 data_end\ncode_begin 0x1000 HLT code_end")
            .unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MalformedNumeral);
    }

    #[test]
    fn tokens_after_code_end_are_ignored() {
        let program = parse_text("code_begin 0x1000 HLT code_end stray tokens").unwrap();
        assert_eq!(program.code.instructions.len(), 1);
    }
}
