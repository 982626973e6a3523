//! Stack of open lexical events

use super::event::{LexEvent, LexEventType};

/// Last-in-first-out stack of opening events.
///
/// The scanner keeps one begin event per open construct so it can build the
/// matching end event and tell which container is currently open. Reading an
/// empty stack is a usage error and panics.
#[derive(Debug, Clone, Default)]
pub struct LexemesStack {
    items: Vec<LexEvent>,
}

impl LexemesStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, lex: LexEvent) {
        self.items.push(lex);
    }

    /// Removes and returns the top event.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn pop(&mut self) -> LexEvent {
        self.items
            .pop()
            .unwrap_or_else(|| panic!("pop from an empty lexemes stack"))
    }

    /// Returns the top event.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn peek(&self) -> &LexEvent {
        self.items
            .last()
            .unwrap_or_else(|| panic!("peek into an empty lexemes stack"))
    }

    /// Returns the event at `index`, counting from the bottom.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> &LexEvent {
        match self.items.get(index) {
            Some(lex) => lex,
            None => panic!(
                "lexemes stack index {} out of range (len {})",
                index,
                self.items.len()
            ),
        }
    }

    /// Returns the kind of the top event, if any.
    pub fn top_kind(&self) -> Option<LexEventType> {
        self.items.last().map(LexEvent::kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;

    fn lex(kind: LexEventType) -> LexEvent {
        LexEvent::new(kind, 0, 0, SourceFile::anonymous("{"))
    }

    #[test]
    fn test_push_pop() {
        let mut stack = LexemesStack::new();
        stack.push(lex(LexEventType::ObjectBegin));
        stack.push(lex(LexEventType::ObjectKeyBegin));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().kind(), LexEventType::ObjectKeyBegin);
        assert_eq!(stack.get(0).kind(), LexEventType::ObjectBegin);
        assert_eq!(stack.pop().kind(), LexEventType::ObjectKeyBegin);
        assert_eq!(stack.top_kind(), Some(LexEventType::ObjectBegin));
    }

    #[test]
    #[should_panic(expected = "empty lexemes stack")]
    fn test_peek_empty_panics() {
        LexemesStack::new().peek();
    }

    #[test]
    #[should_panic(expected = "empty lexemes stack")]
    fn test_pop_empty_panics() {
        LexemesStack::new().pop();
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range_panics() {
        LexemesStack::new().get(3);
    }
}
