//! Source buffers
//!
//! A `SourceFile` is a named, immutable byte buffer shared by every lexical
//! event scanned out of it. Cloning is cheap: the name and the bytes live
//! behind reference counters.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Named byte buffer holding one schema or document.
#[derive(Clone)]
pub struct SourceFile {
    name: Arc<str>,
    content: Arc<[u8]>,
}

/// One physical line of a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number
    pub number: usize,
    /// Byte index of the first byte of the line
    pub begin: usize,
    /// Byte index one past the last byte of the line, line terminator excluded
    pub end: usize,
}

impl SourceFile {
    /// Creates a source buffer from raw bytes.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let name: String = name.into();
        let content: Vec<u8> = content.into();
        Self {
            name: Arc::from(name.as_str()),
            content: Arc::from(content.into_boxed_slice()),
        }
    }

    /// Creates an unnamed source buffer.
    pub fn anonymous(content: impl Into<Vec<u8>>) -> Self {
        Self::new("", content)
    }

    /// Reads a source buffer from disk, naming it after the path.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = fs::read(path)?;
        Ok(Self::new(path.display().to_string(), content))
    }

    /// Returns the buffer name (usually a file name, possibly empty).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the whole buffer.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Returns the buffer length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the bytes between `begin` and `end`, both inclusive.
    ///
    /// Out of range indices are clamped to the buffer.
    pub fn slice(&self, begin: usize, end: usize) -> &[u8] {
        if self.content.is_empty() || begin > end {
            return &[];
        }
        let last = self.content.len() - 1;
        let begin = begin.min(last);
        let end = end.min(last);
        &self.content[begin..=end]
    }

    /// Returns a new buffer holding the first `length` bytes of this one.
    pub fn prefix(&self, length: usize) -> Self {
        let length = length.min(self.content.len());
        Self {
            name: Arc::clone(&self.name),
            content: Arc::from(&self.content[..length]),
        }
    }

    /// Locates the line containing the byte at `index`.
    pub fn line_at(&self, index: usize) -> Line {
        let index = index.min(self.content.len());

        let mut number = 1;
        let mut begin = 0;
        for (i, b) in self.content[..index].iter().enumerate() {
            if *b == b'\n' {
                number += 1;
                begin = i + 1;
            }
        }

        let mut end = begin;
        while end < self.content.len() && self.content[end] != b'\n' {
            end += 1;
        }
        if end > begin && self.content[end - 1] == b'\r' {
            end -= 1;
        }

        Line { number, begin, end }
    }
}

impl PartialEq for SourceFile {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.content, &other.content) || self.content == other.content)
            && self.name == other.name
    }
}

impl Eq for SourceFile {}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_is_inclusive() {
        let file = SourceFile::anonymous("{\"a\": 1}");
        assert_eq!(file.slice(1, 3), b"\"a\"");
        assert_eq!(file.slice(7, 7), b"}");
    }

    #[test]
    fn test_slice_clamps_to_buffer() {
        let file = SourceFile::anonymous("abc");
        assert_eq!(file.slice(1, 100), b"bc");
        assert_eq!(SourceFile::anonymous("").slice(0, 0), b"");
    }

    #[test]
    fn test_line_at() {
        let file = SourceFile::new("a.jschema", "{\n  \"a\": 1\r\n}");
        let line = file.line_at(5);
        assert_eq!(line.number, 2);
        assert_eq!(&file.content()[line.begin..line.end], b"  \"a\": 1");

        let first = file.line_at(0);
        assert_eq!(first.number, 1);
        assert_eq!(first.end, 1);
    }

    #[test]
    fn test_prefix_keeps_name() {
        let file = SourceFile::new("types", "123 456");
        let prefix = file.prefix(3);
        assert_eq!(prefix.name(), "types");
        assert_eq!(prefix.content(), b"123");
    }
}
