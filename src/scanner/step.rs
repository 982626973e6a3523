//! Scanner states and their byte handlers

use super::{Annotation, ScanMode, Scanner};
use crate::errors::{ErrorKind, SchemaResult};
use crate::lexeme::LexEventType;

/// One state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Step {
    // Structure
    BeginRoot,
    AfterTop,
    BeginValue,
    ObjectKeyOrEnd,
    ObjectKey,
    ObjectColon,
    ObjectAfterValue,
    ArrayItemOrEnd,
    ArrayItem,
    ArrayAfterItem,

    // Literals
    String,
    StringEscape,
    StringUnicode(u8),
    BareKey,
    NumberSign,
    NumberZero,
    NumberInt,
    NumberDot,
    NumberFrac,
    NumberExp,
    NumberExpSign,
    NumberExpDigits,
    Keyword(&'static [u8], usize),

    // Shortcuts
    ShortcutName { key: bool, named: bool },
    ShortcutAfterName,
    ShortcutAfterPipe,

    // Comments and annotations
    CommentSlash,
    HashComment,
    InlineStart,
    InlineAfterRules,
    InlineTextLead,
    InlineText,
    MultiLineStart,
    MultiLineAfterRules,
    MultiLineTextLead,
    MultiLineText,
    MultiLineStar { text: bool, star: usize },
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r')
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

fn is_bare_key_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_bare_key_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

impl Scanner {
    /// Feeds one byte to the current state.
    pub(super) fn dispatch(&mut self, c: u8) -> SchemaResult<()> {
        match self.step {
            Step::BeginRoot => self.begin_root(c),
            Step::AfterTop => self.after_top(c),
            Step::BeginValue => {
                if self.skip_space(c)? {
                    return Ok(());
                }
                self.begin_value(c)
            }
            Step::ObjectKeyOrEnd => self.object_key(c, true),
            Step::ObjectKey => self.object_key(c, false),
            Step::ObjectColon => self.object_colon(c),
            Step::ObjectAfterValue => self.object_after_value(c),
            Step::ArrayItemOrEnd => self.array_item(c, true),
            Step::ArrayItem => self.array_item(c, false),
            Step::ArrayAfterItem => self.array_after_item(c),

            Step::String => self.string(c),
            Step::StringEscape => self.string_escape(c),
            Step::StringUnicode(n) => self.string_unicode(c, n),
            Step::BareKey => self.bare_key(c),
            Step::NumberSign => self.number_sign(c),
            Step::NumberZero => self.number_zero(c),
            Step::NumberInt => self.number_int(c),
            Step::NumberDot => self.number_dot(c),
            Step::NumberFrac => self.number_frac(c),
            Step::NumberExp => self.number_exp(c),
            Step::NumberExpSign => self.number_exp_sign(c),
            Step::NumberExpDigits => self.number_exp_digits(c),
            Step::Keyword(word, pos) => self.keyword(c, word, pos),

            Step::ShortcutName { key, named } => self.shortcut_name(c, key, named),
            Step::ShortcutAfterName => self.shortcut_after_name(c),
            Step::ShortcutAfterPipe => self.shortcut_after_pipe(c),

            Step::CommentSlash => self.comment_slash(c),
            Step::HashComment => self.hash_comment(c),
            Step::InlineStart => self.inline_start(c),
            Step::InlineAfterRules => self.inline_after_rules(c),
            Step::InlineTextLead => self.inline_text_lead(c),
            Step::InlineText => self.inline_text(c),
            Step::MultiLineStart => self.multi_line_start(c),
            Step::MultiLineAfterRules => self.multi_line_after_rules(c),
            Step::MultiLineTextLead => self.multi_line_text_lead(c),
            Step::MultiLineText => self.multi_line_text(c),
            Step::MultiLineStar { text, star } => self.multi_line_star(c, text, star),
        }
    }

    /// Handles whitespace, new lines and comment starters between tokens.
    ///
    /// Returns true if the byte was consumed.
    fn skip_space(&mut self, c: u8) -> SchemaResult<bool> {
        match c {
            b' ' | b'\t' | b'\r' => Ok(true),
            b'\n' => {
                if self.annotation == Annotation::Inline {
                    return Err(self.error(ErrorKind::UnexpectedEndOfLine));
                }
                self.marker(LexEventType::NewLine, self.index);
                Ok(true)
            }
            b'/' if self.allows_schema_syntax() => {
                if self.annotation != Annotation::None {
                    return Err(self.invalid(c, "inside annotation"));
                }
                self.steps.push(self.step);
                self.comment_begin = self.index;
                self.step = Step::CommentSlash;
                Ok(true)
            }
            _ if self.is_comment_start(c) => {
                self.steps.push(self.step);
                self.step = Step::HashComment;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ==================
    // Structure
    // ==================

    fn begin_root(&mut self, c: u8) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        self.steps.push(Step::AfterTop);
        self.begin_value(c)
    }

    fn after_top(&mut self, c: u8) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        if self.mode == ScanMode::ComputeLength {
            self.stopped = true;
            return Ok(());
        }
        Err(self.invalid(c, "after top-level value"))
    }

    fn begin_value(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'{' => {
                self.open(LexEventType::ObjectBegin);
                self.step = Step::ObjectKeyOrEnd;
            }
            b'[' => {
                self.open(LexEventType::ArrayBegin);
                self.step = Step::ArrayItemOrEnd;
            }
            b'"' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::String;
            }
            b'-' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::NumberSign;
            }
            b'0' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::NumberZero;
            }
            b'1'..=b'9' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::NumberInt;
            }
            b't' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::Keyword(b"true", 1);
            }
            b'f' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::Keyword(b"false", 1);
            }
            b'n' => {
                self.open(LexEventType::LiteralBegin);
                self.step = Step::Keyword(b"null", 1);
            }
            b'@' if self.allows_schema_syntax() && self.annotation == Annotation::None => {
                self.open(LexEventType::MixedValueBegin);
                self.open(LexEventType::TypesShortcutBegin);
                self.step = Step::ShortcutName {
                    key: false,
                    named: false,
                };
            }
            _ => return Err(self.invalid(c, "looking for beginning of value")),
        }
        Ok(())
    }

    /// Completes a value whose last byte is `self.value_end` and resumes the
    /// enclosing context.
    fn finish_value(&mut self) {
        match self.lexemes.top_kind() {
            Some(LexEventType::ObjectValueBegin) => {
                self.close(LexEventType::ObjectValueEnd, self.value_end)
            }
            Some(LexEventType::ArrayItemBegin) => {
                self.close(LexEventType::ArrayItemEnd, self.value_end)
            }
            None => self.last_significant = Some(self.value_end),
            _ => {}
        }
        self.resume();
    }

    fn object_key(&mut self, c: u8, may_end: bool) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        match c {
            b'}' if may_end => self.close_object(),
            b'"' => {
                self.open(LexEventType::ObjectKeyBegin);
                self.step = Step::String;
            }
            b'@' if self.allows_schema_syntax() && self.annotation == Annotation::None => {
                self.open(LexEventType::KeyShortcutBegin);
                self.step = Step::ShortcutName {
                    key: true,
                    named: false,
                };
            }
            _ if self.annotation != Annotation::None && is_bare_key_start(c) => {
                self.open(LexEventType::ObjectKeyBegin);
                self.step = Step::BareKey;
            }
            _ => return Err(self.invalid(c, "looking for beginning of object key string")),
        }
        Ok(())
    }

    fn object_colon(&mut self, c: u8) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        if c != b':' {
            return Err(self.invalid(c, "after object key"));
        }
        self.open(LexEventType::ObjectValueBegin);
        self.steps.push(Step::ObjectAfterValue);
        self.step = Step::BeginValue;
        Ok(())
    }

    fn object_after_value(&mut self, c: u8) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        match c {
            b',' => self.step = Step::ObjectKey,
            b'}' => self.close_object(),
            _ => return Err(self.invalid(c, "after object key:value pair")),
        }
        Ok(())
    }

    fn close_object(&mut self) {
        self.close(LexEventType::ObjectEnd, self.index);
        self.value_end = self.index;
        self.finish_value();
    }

    fn array_item(&mut self, c: u8, may_end: bool) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        if c == b']' && may_end {
            self.close_array();
            return Ok(());
        }
        self.open(LexEventType::ArrayItemBegin);
        self.steps.push(Step::ArrayAfterItem);
        self.begin_value(c)
    }

    fn array_after_item(&mut self, c: u8) -> SchemaResult<()> {
        if self.skip_space(c)? {
            return Ok(());
        }
        match c {
            b',' => self.step = Step::ArrayItem,
            b']' => self.close_array(),
            _ => return Err(self.invalid(c, "after array element")),
        }
        Ok(())
    }

    fn close_array(&mut self) {
        self.close(LexEventType::ArrayEnd, self.index);
        self.value_end = self.index;
        self.finish_value();
    }

    // ==================
    // Literals
    // ==================

    fn string(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'"' => self.close_string(),
            b'\\' => self.step = Step::StringEscape,
            _ if c < 0x20 => return Err(self.invalid(c, "in string literal")),
            _ => {}
        }
        Ok(())
    }

    fn string_escape(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => self.step = Step::String,
            b'u' => self.step = Step::StringUnicode(0),
            _ => return Err(self.invalid(c, "in string escape code")),
        }
        Ok(())
    }

    fn string_unicode(&mut self, c: u8, n: u8) -> SchemaResult<()> {
        if !c.is_ascii_hexdigit() {
            return Err(self.invalid(c, "in \\u hexadecimal character escape"));
        }
        self.step = if n == 3 {
            Step::String
        } else {
            Step::StringUnicode(n + 1)
        };
        Ok(())
    }

    fn close_string(&mut self) {
        match self.lexemes.top_kind() {
            Some(LexEventType::ObjectKeyBegin) => {
                self.close(LexEventType::ObjectKeyEnd, self.index);
                self.step = Step::ObjectColon;
            }
            _ => self.close_literal(self.index),
        }
    }

    fn close_literal(&mut self, end: usize) {
        self.close(LexEventType::LiteralEnd, end);
        self.value_end = end;
        self.finish_value();
    }

    fn bare_key(&mut self, c: u8) -> SchemaResult<()> {
        if is_bare_key_char(c) {
            return Ok(());
        }
        self.close(LexEventType::ObjectKeyEnd, self.index - 1);
        self.step = Step::ObjectColon;
        self.dispatch(c)
    }

    fn number_sign(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'0' => self.step = Step::NumberZero,
            b'1'..=b'9' => self.step = Step::NumberInt,
            _ => return Err(self.invalid(c, "in numeric literal")),
        }
        Ok(())
    }

    fn number_zero(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'.' => self.step = Step::NumberDot,
            b'e' | b'E' => self.step = Step::NumberExp,
            _ => return self.finish_number(c),
        }
        Ok(())
    }

    fn number_int(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_digit(c) => {}
            b'.' => self.step = Step::NumberDot,
            b'e' | b'E' => self.step = Step::NumberExp,
            _ => return self.finish_number(c),
        }
        Ok(())
    }

    fn number_dot(&mut self, c: u8) -> SchemaResult<()> {
        if !is_digit(c) {
            return Err(self.invalid(c, "after decimal point in numeric literal"));
        }
        self.step = Step::NumberFrac;
        Ok(())
    }

    fn number_frac(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_digit(c) => {}
            b'e' | b'E' => self.step = Step::NumberExp,
            _ => return self.finish_number(c),
        }
        Ok(())
    }

    fn number_exp(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'+' | b'-' => self.step = Step::NumberExpSign,
            _ if is_digit(c) => self.step = Step::NumberExpDigits,
            _ => return Err(self.invalid(c, "in exponent of numeric literal")),
        }
        Ok(())
    }

    fn number_exp_sign(&mut self, c: u8) -> SchemaResult<()> {
        if !is_digit(c) {
            return Err(self.invalid(c, "in exponent of numeric literal"));
        }
        self.step = Step::NumberExpDigits;
        Ok(())
    }

    fn number_exp_digits(&mut self, c: u8) -> SchemaResult<()> {
        if is_digit(c) {
            return Ok(());
        }
        self.finish_number(c)
    }

    /// Closes a number ended by the byte before `c`, then hands `c` on.
    fn finish_number(&mut self, c: u8) -> SchemaResult<()> {
        self.close_literal(self.index - 1);
        self.dispatch(c)
    }

    fn keyword(&mut self, c: u8, word: &'static [u8], pos: usize) -> SchemaResult<()> {
        if c != word[pos] {
            return Err(self.invalid(c, "in literal true, false or null"));
        }
        if pos + 1 == word.len() {
            self.close_literal(self.index);
        } else {
            self.step = Step::Keyword(word, pos + 1);
        }
        Ok(())
    }

    // ==================
    // Shortcuts
    // ==================

    fn shortcut_name(&mut self, c: u8, key: bool, named: bool) -> SchemaResult<()> {
        if is_name_char(c) {
            self.shortcut_last = self.index;
            self.step = Step::ShortcutName { key, named: true };
            return Ok(());
        }
        if !named {
            return Err(self.invalid(c, "in type name"));
        }
        if key {
            self.close(LexEventType::KeyShortcutEnd, self.shortcut_last);
            self.step = Step::ObjectColon;
        } else {
            self.step = Step::ShortcutAfterName;
        }
        self.dispatch(c)
    }

    fn shortcut_after_name(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b' ' | b'\t' => Ok(()),
            b'|' => {
                self.step = Step::ShortcutAfterPipe;
                Ok(())
            }
            _ => {
                self.finish_shortcut();
                self.dispatch(c)
            }
        }
    }

    fn shortcut_after_pipe(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => self.marker(LexEventType::NewLine, self.index),
            b'@' => {
                self.step = Step::ShortcutName {
                    key: false,
                    named: false,
                }
            }
            _ => return Err(self.invalid(c, "in types shortcut, expecting '@'")),
        }
        Ok(())
    }

    fn finish_shortcut(&mut self) {
        self.close(LexEventType::TypesShortcutEnd, self.shortcut_last);
        self.close(LexEventType::MixedValueEnd, self.shortcut_last);
        self.value_end = self.shortcut_last;
        self.finish_value();
    }

    // ==================
    // Comments and annotations
    // ==================

    fn comment_slash(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'/' => {
                self.open_at(LexEventType::InlineAnnotationBegin, self.comment_begin);
                self.annotation = Annotation::Inline;
                self.step = Step::InlineStart;
            }
            b'*' => {
                self.open_at(LexEventType::MultiLineAnnotationBegin, self.comment_begin);
                self.annotation = Annotation::MultiLine;
                self.step = Step::MultiLineStart;
            }
            _ => return Err(self.invalid(c, "after '/', expecting '/' or '*'")),
        }
        Ok(())
    }

    fn hash_comment(&mut self, c: u8) -> SchemaResult<()> {
        if c == b'\n' {
            self.resume();
            return self.dispatch(c);
        }
        Ok(())
    }

    fn inline_start(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => return self.close_inline(c),
            b'{' => {
                self.steps.push(Step::InlineAfterRules);
                self.open(LexEventType::ObjectBegin);
                self.step = Step::ObjectKeyOrEnd;
            }
            _ => self.begin_text(LexEventType::InlineAnnotationTextBegin, Step::InlineText),
        }
        Ok(())
    }

    fn inline_after_rules(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => return self.close_inline(c),
            b'-' => self.step = Step::InlineTextLead,
            _ => self.begin_text(LexEventType::InlineAnnotationTextBegin, Step::InlineText),
        }
        Ok(())
    }

    fn inline_text_lead(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => return self.close_inline(c),
            _ => self.begin_text(LexEventType::InlineAnnotationTextBegin, Step::InlineText),
        }
        Ok(())
    }

    fn inline_text(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => {
                self.close(LexEventType::InlineAnnotationTextEnd, self.text_last);
                return self.close_inline(c);
            }
            _ => self.text_last = self.index,
        }
        Ok(())
    }

    /// Starts annotation text at the current byte.
    fn begin_text(&mut self, kind: LexEventType, next: Step) {
        self.open(kind);
        self.text_last = self.index;
        self.step = next;
    }

    /// Closes an inline annotation ended by the new line `c`.
    fn close_inline(&mut self, c: u8) -> SchemaResult<()> {
        let end = self.inline_end(self.index);
        self.close(LexEventType::InlineAnnotationEnd, end);
        self.leave_annotation(end);
        self.dispatch(c)
    }

    /// Last byte of an inline annotation stopped at `stop`, trailing blanks
    /// excluded.
    pub(super) fn inline_end(&self, stop: usize) -> usize {
        let content = self.file.content();
        let mut end = stop;
        while end > 0 && is_space(content[end - 1]) {
            end -= 1;
        }
        end.saturating_sub(1)
    }

    fn leave_annotation(&mut self, end: usize) {
        self.annotation = Annotation::None;
        if self.lexemes.is_empty() {
            self.last_significant = Some(end);
        }
        self.resume();
    }

    fn multi_line_start(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => self.marker(LexEventType::NewLine, self.index),
            b'*' => {
                self.step = Step::MultiLineStar {
                    text: false,
                    star: self.index,
                }
            }
            b'{' => {
                self.steps.push(Step::MultiLineAfterRules);
                self.open(LexEventType::ObjectBegin);
                self.step = Step::ObjectKeyOrEnd;
            }
            _ => self.begin_text(LexEventType::MultiLineAnnotationTextBegin, Step::MultiLineText),
        }
        Ok(())
    }

    fn multi_line_after_rules(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            b'-' => {
                self.step = Step::MultiLineTextLead;
                Ok(())
            }
            _ => self.multi_line_text_lead(c),
        }
    }

    fn multi_line_text_lead(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => self.marker(LexEventType::NewLine, self.index),
            b'*' => {
                self.step = Step::MultiLineStar {
                    text: false,
                    star: self.index,
                }
            }
            _ => self.begin_text(LexEventType::MultiLineAnnotationTextBegin, Step::MultiLineText),
        }
        Ok(())
    }

    fn multi_line_text(&mut self, c: u8) -> SchemaResult<()> {
        match c {
            _ if is_space(c) => {}
            b'\n' => self.marker(LexEventType::NewLine, self.index),
            b'*' => {
                self.step = Step::MultiLineStar {
                    text: true,
                    star: self.index,
                }
            }
            _ => self.text_last = self.index,
        }
        Ok(())
    }

    /// A `*` was seen: either the annotation ends or the star is text.
    fn multi_line_star(&mut self, c: u8, text: bool, star: usize) -> SchemaResult<()> {
        if c == b'/' {
            if text {
                self.close(LexEventType::MultiLineAnnotationTextEnd, self.text_last);
            }
            self.close(LexEventType::MultiLineAnnotationEnd, self.index);
            self.leave_annotation(self.index);
            return Ok(());
        }

        if !text {
            self.open_at(LexEventType::MultiLineAnnotationTextBegin, star);
        }
        self.text_last = star;
        self.step = Step::MultiLineText;
        self.dispatch(c)
    }

    // ==================
    // End of input
    // ==================

    /// Completes whatever is still open once the input is exhausted.
    pub(super) fn finish_input(&mut self) -> SchemaResult<()> {
        let last = self.file.len().saturating_sub(1);
        self.index = self.file.len();

        loop {
            match self.step {
                Step::AfterTop => {
                    self.marker(LexEventType::EndTop, last);
                    return Ok(());
                }
                Step::BeginRoot => {
                    return Err(self.error(ErrorKind::EmptyInput));
                }
                Step::NumberZero | Step::NumberInt | Step::NumberFrac | Step::NumberExpDigits => {
                    self.close_literal(last);
                }
                Step::ShortcutName { key: false, named: true } | Step::ShortcutAfterName => {
                    self.finish_shortcut();
                }
                Step::HashComment => self.resume(),
                Step::InlineText => {
                    self.close(LexEventType::InlineAnnotationTextEnd, self.text_last);
                    self.finish_inline_at_eof();
                }
                Step::InlineStart | Step::InlineAfterRules | Step::InlineTextLead => {
                    self.finish_inline_at_eof();
                }
                _ => return Err(self.error(ErrorKind::UnexpectedEof)),
            }
        }
    }

    fn finish_inline_at_eof(&mut self) {
        let end = self.inline_end(self.file.len());
        self.close(LexEventType::InlineAnnotationEnd, end);
        self.leave_annotation(end);
    }
}
