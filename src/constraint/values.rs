//! Rule value parsing
//!
//! Rule values are literal text taken from an annotation. A value of the
//! wrong JSON type is `IncorrectRuleValueType`; a value of the right type
//! but out of range is `InvalidValueOfConstraint`. Errors carry no position;
//! the loader places them on the rule value.

use regex::Regex;

use crate::errors::{ErrorKind, SchemaResult};
use crate::json::{parse_number, unquote, JsonType, Number};

fn wrong_type(rule: &str) -> ErrorKind {
    ErrorKind::IncorrectRuleValueType(rule.to_string())
}

pub fn bool_value(rule: &str, value: &[u8]) -> SchemaResult<bool> {
    match value {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(wrong_type(rule).into()),
    }
}

pub fn number_value(rule: &str, value: &[u8]) -> SchemaResult<Number> {
    if !JsonType::of_literal(value).is_number() {
        return Err(wrong_type(rule).into());
    }
    parse_number(value).ok_or_else(|| wrong_type(rule).into())
}

/// Parses a length or item count: a non-negative integer.
pub fn count_value(rule: &str, value: &[u8]) -> SchemaResult<usize> {
    number_value(rule, value)?
        .to_usize()
        .ok_or_else(|| ErrorKind::InvalidValueOfConstraint(rule.to_string()).into())
}

pub fn string_value(rule: &str, value: &[u8]) -> SchemaResult<String> {
    if JsonType::of_literal(value) != JsonType::String {
        return Err(wrong_type(rule).into());
    }
    unquote(value)
}

/// Parses a `precision` value: a positive integer.
pub fn precision_value(value: &[u8]) -> SchemaResult<u32> {
    let number = number_value("precision", value)?;
    if number.is_negative() || !number.is_integer() {
        return Err(ErrorKind::InvalidValueOfConstraint("precision".to_string()).into());
    }
    if number.is_zero() {
        return Err(ErrorKind::ZeroPrecision.into());
    }
    number
        .to_usize()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ErrorKind::InvalidValueOfConstraint("precision".to_string()).into())
}

pub fn regex_value(value: &[u8]) -> SchemaResult<Regex> {
    let pattern = string_value("regex", value)?;
    Regex::new(&pattern).map_err(|e| ErrorKind::InvalidRegex(e.to_string()).into())
}
