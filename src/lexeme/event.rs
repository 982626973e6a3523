//! Lexical events

use std::fmt;

use crate::source::SourceFile;

/// Kind of a lexical event.
///
/// Most kinds come in begin/end pairs; `NewLine` and `EndTop` are standalone
/// markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexEventType {
    LiteralBegin,
    LiteralEnd,
    ObjectBegin,
    ObjectEnd,
    ObjectKeyBegin,
    ObjectKeyEnd,
    ObjectValueBegin,
    ObjectValueEnd,
    ArrayBegin,
    ArrayEnd,
    ArrayItemBegin,
    ArrayItemEnd,
    InlineAnnotationBegin,
    InlineAnnotationEnd,
    InlineAnnotationTextBegin,
    InlineAnnotationTextEnd,
    MultiLineAnnotationBegin,
    MultiLineAnnotationEnd,
    MultiLineAnnotationTextBegin,
    MultiLineAnnotationTextEnd,
    TypesShortcutBegin,
    TypesShortcutEnd,
    KeyShortcutBegin,
    KeyShortcutEnd,
    MixedValueBegin,
    MixedValueEnd,
    NewLine,
    EndTop,
}

impl LexEventType {
    /// Returns the event name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            LexEventType::LiteralBegin => "literal-begin",
            LexEventType::LiteralEnd => "literal-end",
            LexEventType::ObjectBegin => "object-begin",
            LexEventType::ObjectEnd => "object-end",
            LexEventType::ObjectKeyBegin => "key-begin",
            LexEventType::ObjectKeyEnd => "key-end",
            LexEventType::ObjectValueBegin => "value-begin",
            LexEventType::ObjectValueEnd => "value-end",
            LexEventType::ArrayBegin => "array-begin",
            LexEventType::ArrayEnd => "array-end",
            LexEventType::ArrayItemBegin => "item-begin",
            LexEventType::ArrayItemEnd => "item-end",
            LexEventType::InlineAnnotationBegin => "inline-annotation-begin",
            LexEventType::InlineAnnotationEnd => "inline-annotation-end",
            LexEventType::InlineAnnotationTextBegin => "inline-annotation-text-begin",
            LexEventType::InlineAnnotationTextEnd => "inline-annotation-text-end",
            LexEventType::MultiLineAnnotationBegin => "multi-line-annotation-begin",
            LexEventType::MultiLineAnnotationEnd => "multi-line-annotation-end",
            LexEventType::MultiLineAnnotationTextBegin => "multi-line-annotation-text-begin",
            LexEventType::MultiLineAnnotationTextEnd => "multi-line-annotation-text-end",
            LexEventType::TypesShortcutBegin => "types-shortcut-begin",
            LexEventType::TypesShortcutEnd => "types-shortcut-end",
            LexEventType::KeyShortcutBegin => "key-shortcut-begin",
            LexEventType::KeyShortcutEnd => "key-shortcut-end",
            LexEventType::MixedValueBegin => "mixed-value-begin",
            LexEventType::MixedValueEnd => "mixed-value-end",
            LexEventType::NewLine => "new-line",
            LexEventType::EndTop => "end-top",
        }
    }

    /// Returns true for the opening half of a begin/end pair.
    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            LexEventType::LiteralBegin
                | LexEventType::ObjectBegin
                | LexEventType::ObjectKeyBegin
                | LexEventType::ObjectValueBegin
                | LexEventType::ArrayBegin
                | LexEventType::ArrayItemBegin
                | LexEventType::InlineAnnotationBegin
                | LexEventType::InlineAnnotationTextBegin
                | LexEventType::MultiLineAnnotationBegin
                | LexEventType::MultiLineAnnotationTextBegin
                | LexEventType::TypesShortcutBegin
                | LexEventType::KeyShortcutBegin
                | LexEventType::MixedValueBegin
        )
    }

    /// Returns the closing kind paired with an opening kind.
    pub fn closing(&self) -> Option<LexEventType> {
        let closing = match self {
            LexEventType::LiteralBegin => LexEventType::LiteralEnd,
            LexEventType::ObjectBegin => LexEventType::ObjectEnd,
            LexEventType::ObjectKeyBegin => LexEventType::ObjectKeyEnd,
            LexEventType::ObjectValueBegin => LexEventType::ObjectValueEnd,
            LexEventType::ArrayBegin => LexEventType::ArrayEnd,
            LexEventType::ArrayItemBegin => LexEventType::ArrayItemEnd,
            LexEventType::InlineAnnotationBegin => LexEventType::InlineAnnotationEnd,
            LexEventType::InlineAnnotationTextBegin => LexEventType::InlineAnnotationTextEnd,
            LexEventType::MultiLineAnnotationBegin => LexEventType::MultiLineAnnotationEnd,
            LexEventType::MultiLineAnnotationTextBegin => {
                LexEventType::MultiLineAnnotationTextEnd
            }
            LexEventType::TypesShortcutBegin => LexEventType::TypesShortcutEnd,
            LexEventType::KeyShortcutBegin => LexEventType::KeyShortcutEnd,
            LexEventType::MixedValueBegin => LexEventType::MixedValueEnd,
            _ => return None,
        };
        Some(closing)
    }

    /// Returns true for events that start a value.
    pub fn is_value_begin(&self) -> bool {
        matches!(
            self,
            LexEventType::LiteralBegin
                | LexEventType::ObjectBegin
                | LexEventType::ArrayBegin
                | LexEventType::MixedValueBegin
        )
    }
}

impl fmt::Display for LexEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One typed, positioned token.
///
/// `begin` and `end` are inclusive byte indices into the source buffer. For
/// a closing event the range covers the whole construct, from the opening
/// byte to the closing one.
#[derive(Clone, PartialEq, Eq)]
pub struct LexEvent {
    kind: LexEventType,
    begin: usize,
    end: usize,
    file: SourceFile,
}

impl LexEvent {
    pub fn new(kind: LexEventType, begin: usize, end: usize, file: SourceFile) -> Self {
        Self {
            kind,
            begin,
            end,
            file,
        }
    }

    pub fn kind(&self) -> LexEventType {
        self.kind
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Returns the bytes covered by the event.
    pub fn value(&self) -> &[u8] {
        self.file.slice(self.begin, self.end)
    }

    /// Returns the covered bytes as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.value()).into_owned()
    }
}

impl fmt::Debug for LexEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}..={}] {:?}",
            self.kind,
            self.begin,
            self.end,
            String::from_utf8_lossy(self.value())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_lazy_slice() {
        let file = SourceFile::anonymous("{\"a\": 12}");
        let lex = LexEvent::new(LexEventType::LiteralEnd, 6, 7, file);
        assert_eq!(lex.value(), b"12");
        assert_eq!(lex.text(), "12");
    }

    #[test]
    fn test_pairs() {
        assert_eq!(
            LexEventType::ObjectBegin.closing(),
            Some(LexEventType::ObjectEnd)
        );
        assert!(LexEventType::MixedValueBegin.is_opening());
        assert!(!LexEventType::NewLine.is_opening());
        assert_eq!(LexEventType::EndTop.closing(), None);
    }
}
