//! JSON value model
//!
//! The JSON types the engine reasons about, classification of literal text
//! produced by the scanner and decoding of string literals.

mod number;

pub use number::Number;

use std::fmt;

use serde::Serialize;

use crate::errors::{ErrorKind, SchemaError, SchemaResult};

/// JSON type of a node or a document value.
///
/// `Mixed` marks schema positions whose concrete type is only known per
/// document (`or` sets and shortcuts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Null,
    Mixed,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Float => "float",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
            JsonType::Mixed => "mixed",
        }
    }

    /// Classifies the text of a literal value.
    ///
    /// Numbers with a fraction or an exponent are floats. The text is
    /// expected to have passed the scanner; anything unrecognised is a
    /// string.
    pub fn of_literal(value: &[u8]) -> JsonType {
        match value.first() {
            Some(b't') | Some(b'f') => JsonType::Boolean,
            Some(b'n') => JsonType::Null,
            Some(b'-') | Some(b'0'..=b'9') => {
                if value.iter().any(|b| matches!(b, b'.' | b'e' | b'E')) {
                    JsonType::Float
                } else {
                    JsonType::Integer
                }
            }
            _ => JsonType::String,
        }
    }

    /// Returns true if a value of type `actual` may stand where `self` is
    /// expected. Integers widen to floats.
    pub fn accepts(&self, actual: JsonType) -> bool {
        *self == actual || (*self == JsonType::Float && actual == JsonType::Integer)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsonType::Integer | JsonType::Float)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, JsonType::Array | JsonType::Object | JsonType::Mixed)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decodes a quoted JSON string literal.
pub fn unquote(value: &[u8]) -> SchemaResult<String> {
    serde_json::from_slice::<String>(value).map_err(|err| {
        SchemaError::new(ErrorKind::InvalidValueType(
            "string".to_string(),
            err.to_string(),
        ))
    })
}

/// Parses the text of a number literal.
pub fn parse_number(value: &[u8]) -> Option<Number> {
    std::str::from_utf8(value).ok().and_then(Number::parse)
}

/// Returns the text of a literal for messages, unquoting strings.
pub fn display_literal(value: &[u8]) -> String {
    match JsonType::of_literal(value) {
        JsonType::String => unquote(value).unwrap_or_else(|_| String::from_utf8_lossy(value).into()),
        _ => String::from_utf8_lossy(value).into_owned(),
    }
}

/// Canonical form of a literal used to compare values for equality.
///
/// Numbers compare by value and strings by their decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralKey {
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
}

impl LiteralKey {
    pub fn of(value: &[u8]) -> SchemaResult<LiteralKey> {
        Ok(match JsonType::of_literal(value) {
            JsonType::String => LiteralKey::String(unquote(value)?),
            JsonType::Integer | JsonType::Float => match parse_number(value) {
                Some(number) => LiteralKey::Number(number),
                None => LiteralKey::String(String::from_utf8_lossy(value).into_owned()),
            },
            JsonType::Boolean => LiteralKey::Boolean(value == b"true"),
            _ => LiteralKey::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_literals() {
        assert_eq!(JsonType::of_literal(b"\"x\""), JsonType::String);
        assert_eq!(JsonType::of_literal(b"12"), JsonType::Integer);
        assert_eq!(JsonType::of_literal(b"-1.5"), JsonType::Float);
        assert_eq!(JsonType::of_literal(b"1e3"), JsonType::Float);
        assert_eq!(JsonType::of_literal(b"false"), JsonType::Boolean);
        assert_eq!(JsonType::of_literal(b"null"), JsonType::Null);
    }

    #[test]
    fn test_integer_widens_to_float() {
        assert!(JsonType::Float.accepts(JsonType::Integer));
        assert!(!JsonType::Integer.accepts(JsonType::Float));
        assert!(!JsonType::String.accepts(JsonType::Null));
    }

    #[test]
    fn test_unquote_decodes_escapes() {
        assert_eq!(unquote(b"\"a\\nb\\u00e9\"").unwrap(), "a\nb\u{e9}");
        assert!(unquote(b"\"unterminated").is_err());
    }

    #[test]
    fn test_literal_keys_compare_by_value() {
        assert_eq!(LiteralKey::of(b"1.0").unwrap(), LiteralKey::of(b"1").unwrap());
        assert_eq!(
            LiteralKey::of(b"\"\\u0041\"").unwrap(),
            LiteralKey::of(b"\"A\"").unwrap()
        );
        assert_ne!(LiteralKey::of(b"1").unwrap(), LiteralKey::of(b"\"1\"").unwrap());
    }
}
