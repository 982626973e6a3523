//! Lexeme model
//!
//! The vocabulary shared by the scanner and every consumer of its output:
//! typed, positioned lexical events and the stack the scanner uses to pair
//! opening and closing events.

mod event;
mod stack;

pub use event::{LexEvent, LexEventType};
pub use stack::LexemesStack;
