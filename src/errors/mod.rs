//! Error taxonomy for the schema engine
//!
//! Every failure carries a numeric code, a human readable message and, when
//! known, the source position of the offending byte. Codes are grouped by the
//! subsystem that detects them:
//!
//! - 11xx lexical (scanner)
//! - 12xx loader structure
//! - 13xx rule values
//! - 14xx schema consistency (checker)
//! - 15xx document validation
//! - 16xx `allOf` merging
//!
//! Programmer errors (stack underflow, impossible branches) are panics and
//! never show up here.

mod kind;

pub use kind::ErrorKind;

use std::fmt;

use crate::lexeme::LexEvent;
use crate::source::SourceFile;

/// Position of an error inside a source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Buffer the error refers to
    pub file: SourceFile,
    /// Byte index of the offending byte
    pub index: usize,
}

impl Position {
    pub fn new(file: SourceFile, index: usize) -> Self {
        Self { file, index }
    }

    /// Returns the 1-based line number of the position.
    pub fn line(&self) -> usize {
        self.file.line_at(self.index).number
    }

    /// Renders the source line with a caret under the offending byte.
    pub fn excerpt(&self) -> String {
        let line = self.file.line_at(self.index);
        let text = String::from_utf8_lossy(&self.file.content()[line.begin..line.end]);
        let column = self.index.saturating_sub(line.begin);
        let caret_column = if column > line.end - line.begin {
            line.end - line.begin
        } else {
            column
        };
        format!("> {}\n\t--{}^", text, "-".repeat(caret_column))
    }
}

/// Positioned schema engine error.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    kind: ErrorKind,
    position: Option<Position>,
}

impl SchemaError {
    /// Creates an error without a position.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    /// Creates an error positioned at the given byte of a buffer.
    pub fn at_index(kind: ErrorKind, file: &SourceFile, index: usize) -> Self {
        Self {
            kind,
            position: Some(Position::new(file.clone(), index)),
        }
    }

    /// Creates an error positioned at the first byte of a lexical event.
    pub fn at_lex(kind: ErrorKind, lex: &LexEvent) -> Self {
        Self::at_index(kind, lex.file(), lex.begin())
    }

    /// Positions the error at `lex` unless it already has a position.
    pub fn or_at(mut self, lex: &LexEvent) -> Self {
        if self.position.is_none() {
            self.position = Some(Position::new(lex.file().clone(), lex.begin()));
        }
        self
    }

    /// Moves the error onto `lex`, replacing any previous position.
    pub fn reposition(mut self, lex: &LexEvent) -> Self {
        self.position = Some(Position::new(lex.file().clone(), lex.begin()));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the numeric error code.
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    /// Returns the human readable message without position details.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Returns the error position if known.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Returns the 1-based line number if the position is known.
    pub fn line(&self) -> Option<usize> {
        self.position.as_ref().map(Position::line)
    }

    /// Returns the byte index if the position is known.
    pub fn index(&self) -> Option<usize> {
        self.position.as_ref().map(|p| p.index)
    }
}

impl From<ErrorKind> for SchemaError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR (code {}): {}", self.kind.code(), self.kind)?;
        if let Some(position) = &self.position {
            write!(
                f,
                "\n\tin line {} on file {}\n\t{}",
                position.line(),
                position.file.name(),
                position.excerpt()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for every schema engine operation
pub type SchemaResult<T> = Result<T, SchemaError>;
