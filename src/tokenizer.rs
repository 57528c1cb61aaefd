use crate::constant::{COMMENT, DELIMITERS};
use crate::data::{LoadError, LoadErrorCode};
use colorize::AnsiColor;
use std::fs::File;
use std::io::Read;

/// A program source file held in memory so errors can be pointed back at the
/// offending line.
pub struct Source {
    path: String,
    text: String,
}

impl Source {
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            path: path.to_string(),
            text: text.to_string(),
        }
    }

    pub fn read(path: &str) -> Result<Self, LoadError> {
        let mut file = File::open(path).map_err(|err| {
            LoadError::new(
                LoadErrorCode::SourceFileError,
                format!("could not open file [ {path} ] :: {err}"),
            )
        })?;
        let mut text = String::new();
        file.read_to_string(&mut text).map_err(|err| {
            LoadError::new(
                LoadErrorCode::SourceFileError,
                format!("could not read file [ {path} ] :: {err}"),
            )
        })?;
        Ok(Self::new(path, &text))
    }

    pub fn traceback(&self, token: &Token) -> String {
        let line = self.text.lines().nth(token.line).unwrap_or_default();
        let highlight = {
            let mut buf = " ".repeat(token.column);
            buf.push_str("^".red().as_str());
            let squiggle = "~".repeat(token.text.len().saturating_sub(1));
            buf.push_str(squiggle.yellow().as_str());
            buf
        };
        format!(
            "at {}:{}:{}:\n{line}\n{highlight}",
            self.path,
            token.line + 1,
            token.column + 1,
        )
    }
}

/// One delimiter-free piece of a source line, tagged with where it came
/// from. Position indices are zero-based internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(text: &str, line: usize, column: usize) -> Self {
        Self {
            text: text.to_string(),
            line,
            column,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Splits the whole source into one continuous token stream. Tokenizing is
/// total: blank and comment-only lines simply contribute nothing.
pub fn tokenize(source: &Source) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (line_no, line) in source.text.lines().enumerate() {
        tokenize_line(line, line_no, &mut tokens);
    }
    tokens
}

// Drop everything from the comment marker on, then cut the rest on the
// delimiter set, preserving left-to-right order.
fn tokenize_line(line: &str, line_no: usize, tokens: &mut Vec<Token>) {
    let line = match line.find(COMMENT) {
        Some(comment_start) => &line[..comment_start],
        None => line,
    };
    let mut token_start: Option<usize> = None;
    for (i, chr) in line.char_indices() {
        if DELIMITERS.contains(chr) {
            if let Some(start) = token_start.take() {
                tokens.push(Token::new(&line[start..i], line_no, start));
            }
        } else if token_start.is_none() {
            token_start = Some(i);
        }
    }
    if let Some(start) = token_start {
        tokens.push(Token::new(&line[start..], line_no, start));
    }
}

/// Read-only cursor over the token stream. Parsing stages advance it in
/// order; none of them ever rewind or share it.
pub struct TokenCursor {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.position)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn next(&mut self) -> Option<&Token> {
        if self.position < self.tokens.len() {
            self.position += 1;
            self.tokens.get(self.position - 1)
        } else {
            None
        }
    }
}
