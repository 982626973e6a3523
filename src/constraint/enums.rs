//! `enum` and `const` rules

use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::{display_literal, LiteralKey};
use crate::lexeme::LexEvent;

/// One allowed value of an `enum` rule.
#[derive(Debug, Clone)]
pub struct EnumItem {
    pub lex: LexEvent,
    key: LiteralKey,
}

impl EnumItem {
    pub fn new(lex: LexEvent) -> SchemaResult<Self> {
        let key = LiteralKey::of(lex.value()).map_err(|e| e.or_at(&lex))?;
        Ok(Self { lex, key })
    }

    pub fn key(&self) -> &LiteralKey {
        &self.key
    }
}

/// The `enum` rule: the value must equal one of the listed literals.
#[derive(Debug, Clone, Default)]
pub struct EnumConstraint {
    items: Vec<EnumItem>,
}

impl EnumConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, rejecting duplicates.
    pub fn push(&mut self, item: EnumItem) -> SchemaResult<()> {
        if self.items.iter().any(|i| i.key == item.key) {
            return Err(SchemaError::at_lex(
                ErrorKind::DuplicationInEnumRule(item.lex.text()),
                &item.lex,
            ));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn items(&self) -> &[EnumItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &[u8]) -> SchemaResult<bool> {
        let key = LiteralKey::of(value)?;
        Ok(self.items.iter().any(|i| i.key == key))
    }

    pub fn validate(&self, value: &[u8]) -> SchemaResult<()> {
        if self.contains(value)? {
            Ok(())
        } else {
            Err(ErrorKind::DoesNotMatchAnyOfTheEnumValues.into())
        }
    }
}

/// The `const` rule: with `true` the value must equal the example.
#[derive(Debug, Clone)]
pub struct ConstConstraint {
    pub apply: bool,
    example: Vec<u8>,
}

impl ConstConstraint {
    pub fn new(apply: bool, example: &[u8]) -> Self {
        Self {
            apply,
            example: example.to_vec(),
        }
    }

    pub fn example(&self) -> &[u8] {
        &self.example
    }

    pub fn validate(&self, value: &[u8]) -> SchemaResult<()> {
        if !self.apply || LiteralKey::of(value)? == LiteralKey::of(&self.example)? {
            return Ok(());
        }
        Err(ErrorKind::DoesNotMatchConst(display_literal(&self.example)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexeme::LexEventType;
    use crate::source::SourceFile;

    fn items(text: &str) -> Vec<LexEvent> {
        let file = SourceFile::anonymous(text);
        let mut lexes = Vec::new();
        let mut begin = 0;
        for part in text.split(',') {
            let end = begin + part.len() - 1;
            lexes.push(LexEvent::new(LexEventType::LiteralEnd, begin, end, file.clone()));
            begin = end + 2;
        }
        lexes
    }

    #[test]
    fn test_enum_membership() {
        let mut rule = EnumConstraint::new();
        for lex in items("\"white\",\"black\",1") {
            rule.push(EnumItem::new(lex).unwrap()).unwrap();
        }
        assert!(rule.validate(b"\"black\"").is_ok());
        assert!(rule.validate(b"1.0").is_ok());
        assert_eq!(rule.validate(b"\"red\"").unwrap_err().code(), 1508);
    }

    #[test]
    fn test_enum_rejects_duplicates() {
        let mut rule = EnumConstraint::new();
        let lexes = items("1,2,1.0");
        rule.push(EnumItem::new(lexes[0].clone()).unwrap()).unwrap();
        rule.push(EnumItem::new(lexes[1].clone()).unwrap()).unwrap();
        let err = rule.push(EnumItem::new(lexes[2].clone()).unwrap()).unwrap_err();
        assert_eq!(err.code(), 1213);
        assert_eq!(err.index(), Some(4));
    }

    #[test]
    fn test_const() {
        let rule = ConstConstraint::new(true, b"\"cat\"");
        assert!(rule.validate(b"\"cat\"").is_ok());
        assert_eq!(rule.validate(b"\"dog\"").unwrap_err().code(), 1511);
        assert!(ConstConstraint::new(false, b"1").validate(b"2").is_ok());
    }
}
