//! Lexical scanner
//!
//! Converts a byte buffer into an ordered sequence of lexical events: JSON
//! structure plus the schema-only extensions (annotations, `#` comments,
//! `@Name` shortcuts).
//!
//! # Design
//!
//! The scanner is a finite-state machine fed one byte at a time. The current
//! state is a [`Step`]; a stack of pending steps records where to resume once
//! a nested construct (object, array, annotation, comment) completes, so
//! arbitrarily deep input never grows the call stack. A parallel
//! [`LexemesStack`] keeps the opening event of every open construct, which is
//! how closing events get their full byte range and how the scanner knows
//! which container a finished value belongs to.
//!
//! Events are produced lazily: [`Scanner::next`] runs the machine only until
//! at least one event is available.

mod step;

use std::collections::VecDeque;

use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::lexeme::{LexEvent, LexEventType, LexemesStack};
use crate::source::SourceFile;

use step::Step;

/// What the scanner accepts and how far it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Schema grammar: annotations, `#` comments and shortcuts allowed
    Schema,
    /// Plain JSON documents
    Document,
    /// Schema grammar, stopping after the first top-level value and its
    /// trailing annotations
    ComputeLength,
}

/// Annotation context of the current byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annotation {
    None,
    Inline,
    MultiLine,
}

/// Byte-level scanner producing lexical events.
pub struct Scanner {
    file: SourceFile,
    mode: ScanMode,

    /// Current state
    step: Step,
    /// States to resume once the current construct completes
    steps: Vec<Step>,
    /// Opening events of the constructs still open
    lexemes: LexemesStack,
    /// Events scanned but not yet handed out
    found: VecDeque<LexEvent>,

    /// Index of the byte being processed
    index: usize,
    annotation: Annotation,

    /// Last byte of the most recently finished value
    value_end: usize,
    /// Last byte of the text of an open annotation
    text_last: usize,
    /// Last name byte of an open shortcut
    shortcut_last: usize,
    /// First byte of a `/` comment starter
    comment_begin: usize,
    /// Last byte belonging to the top-level value or its annotations
    last_significant: Option<usize>,

    /// Compute-length mode met the first byte past the top-level value
    stopped: bool,
    finished: bool,
}

impl Scanner {
    /// Creates a scanner for schema sources.
    pub fn new(file: SourceFile) -> Self {
        Self::with_mode(file, ScanMode::Schema)
    }

    /// Creates a scanner for plain JSON documents.
    pub fn for_document(file: SourceFile) -> Self {
        Self::with_mode(file, ScanMode::Document)
    }

    pub fn with_mode(file: SourceFile, mode: ScanMode) -> Self {
        Self {
            file,
            mode,
            step: Step::BeginRoot,
            steps: Vec::with_capacity(16),
            lexemes: LexemesStack::new(),
            found: VecDeque::with_capacity(4),
            index: 0,
            annotation: Annotation::None,
            value_end: 0,
            text_last: 0,
            shortcut_last: 0,
            comment_begin: 0,
            last_significant: None,
            stopped: false,
            finished: false,
        }
    }

    /// Returns the buffer being scanned.
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Returns the next lexical event, or `None` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a positioned lexical error on malformed input. The scanner is
    /// finished after an error; further calls return `Ok(None)`.
    pub fn next(&mut self) -> SchemaResult<Option<LexEvent>> {
        loop {
            if let Some(lex) = self.found.pop_front() {
                return Ok(Some(lex));
            }
            if self.finished {
                return Ok(None);
            }

            let result = if self.stopped || self.index >= self.file.len() {
                let result = self.finish_input();
                self.finished = true;
                result
            } else {
                let c = self.file.content()[self.index];
                let result = self.dispatch(c);
                self.index += 1;
                result
            };

            if let Err(err) = result {
                self.finished = true;
                self.found.clear();
                return Err(err);
            }
        }
    }

    /// Scans only the first top-level value and its trailing annotations and
    /// returns their length in bytes.
    ///
    /// Used to carve one type definition out of a larger buffer.
    pub fn length(file: SourceFile) -> SchemaResult<usize> {
        let mut scanner = Self::with_mode(file, ScanMode::ComputeLength);
        while scanner.next()?.is_some() {}
        Ok(scanner.last_significant.map_or(0, |last| last + 1))
    }

    // ==================
    // Event emission
    // ==================

    /// Emits an opening event at the current byte and remembers it.
    fn open(&mut self, kind: LexEventType) {
        self.open_at(kind, self.index);
    }

    fn open_at(&mut self, kind: LexEventType, index: usize) {
        let lex = LexEvent::new(kind, index, index, self.file.clone());
        self.lexemes.push(lex.clone());
        self.found.push_back(lex);
    }

    /// Emits the closing event of the innermost open construct.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open construct is not the one `kind` closes;
    /// the state machine never allows that.
    fn close(&mut self, kind: LexEventType, end: usize) {
        let opening = self.lexemes.pop();
        assert_eq!(
            opening.kind().closing(),
            Some(kind),
            "scanner closes {} while {} is open",
            kind,
            opening.kind()
        );
        self.found
            .push_back(LexEvent::new(kind, opening.begin(), end, self.file.clone()));
    }

    /// Emits a standalone marker event.
    fn marker(&mut self, kind: LexEventType, index: usize) {
        self.found
            .push_back(LexEvent::new(kind, index, index, self.file.clone()));
    }

    fn error(&self, kind: ErrorKind) -> SchemaError {
        SchemaError::at_index(kind, &self.file, self.index)
    }

    fn invalid(&self, c: u8, context: &'static str) -> SchemaError {
        self.error(ErrorKind::InvalidCharacter(c as char, context))
    }

    /// Resumes the enclosing context.
    ///
    /// # Panics
    ///
    /// Panics on an empty step stack.
    fn resume(&mut self) {
        self.step = self
            .steps
            .pop()
            .unwrap_or_else(|| panic!("resume from an empty scanner step stack"));
    }

    fn allows_schema_syntax(&self) -> bool {
        self.mode != ScanMode::Document
    }

    /// `#` starts a comment outside annotations and inside inline ones, never
    /// inside a multi-line annotation.
    fn is_comment_start(&self, c: u8) -> bool {
        c == b'#'
            && self.allows_schema_syntax()
            && matches!(self.annotation, Annotation::None | Annotation::Inline)
    }
}

impl Iterator for Scanner {
    type Item = SchemaResult<LexEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        Scanner::next(self).transpose()
    }
}
