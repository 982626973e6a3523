//! Constraint library
//!
//! Every rule that can be attached to a schema node. Each constraint knows
//! which JSON types it applies to and, for rules that restrict literal
//! values, how to check one.
//!
//! A node keeps its constraints in a [`ConstraintMap`], one entry per
//! [`ConstraintType`]. The ordering of `ConstraintType` is the order in
//! which literal checks run, so the first reported failure is stable.

mod enums;
mod format;
mod types;
pub mod values;

pub use enums::{ConstConstraint, EnumConstraint, EnumItem};
pub use format::Format;
pub use types::{
    check_user_type_name, is_user_type_name, AdditionalProperties, SchemaType, TypeConstraint,
    TypeRef, TypesList,
};

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::collections::OrderedMap;
use crate::errors::{ErrorKind, SchemaResult};
use crate::json::{parse_number, unquote, JsonType, Number};

/// Constraints of one node keyed by their type, in declaration order.
pub type ConstraintMap = OrderedMap<ConstraintType, Constraint>;

/// Kind of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintType {
    Type,
    Nullable,
    Optional,
    Enum,
    Const,
    Or,
    TypesList,
    Any,
    Min,
    Max,
    ExclusiveMinimum,
    ExclusiveMaximum,
    Precision,
    MinLength,
    MaxLength,
    Regex,
    MinItems,
    MaxItems,
    Email,
    Uri,
    Date,
    DateTime,
    Uuid,
    AdditionalProperties,
    RequiredKeys,
    AllOf,
}

impl ConstraintType {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintType::Type => "type",
            ConstraintType::Nullable => "nullable",
            ConstraintType::Optional => "optional",
            ConstraintType::Enum => "enum",
            ConstraintType::Const => "const",
            ConstraintType::Or => "or",
            ConstraintType::TypesList => "types",
            ConstraintType::Any => "any",
            ConstraintType::Min => "min",
            ConstraintType::Max => "max",
            ConstraintType::ExclusiveMinimum => "exclusiveMinimum",
            ConstraintType::ExclusiveMaximum => "exclusiveMaximum",
            ConstraintType::Precision => "precision",
            ConstraintType::MinLength => "minLength",
            ConstraintType::MaxLength => "maxLength",
            ConstraintType::Regex => "regex",
            ConstraintType::MinItems => "minItems",
            ConstraintType::MaxItems => "maxItems",
            ConstraintType::Email => "email",
            ConstraintType::Uri => "uri",
            ConstraintType::Date => "date",
            ConstraintType::DateTime => "datetime",
            ConstraintType::Uuid => "uuid",
            ConstraintType::AdditionalProperties => "additionalProperties",
            ConstraintType::RequiredKeys => "requiredKeys",
            ConstraintType::AllOf => "allOf",
        }
    }

    /// Maps a rule name written in an annotation. Generated constraints have
    /// no rule name.
    pub fn from_rule_name(name: &str) -> Option<ConstraintType> {
        let t = match name {
            "type" => ConstraintType::Type,
            "nullable" => ConstraintType::Nullable,
            "optional" => ConstraintType::Optional,
            "enum" => ConstraintType::Enum,
            "const" => ConstraintType::Const,
            "or" => ConstraintType::Or,
            "min" => ConstraintType::Min,
            "max" => ConstraintType::Max,
            "exclusiveMinimum" => ConstraintType::ExclusiveMinimum,
            "exclusiveMaximum" => ConstraintType::ExclusiveMaximum,
            "precision" => ConstraintType::Precision,
            "minLength" => ConstraintType::MinLength,
            "maxLength" => ConstraintType::MaxLength,
            "regex" => ConstraintType::Regex,
            "minItems" => ConstraintType::MinItems,
            "maxItems" => ConstraintType::MaxItems,
            "additionalProperties" => ConstraintType::AdditionalProperties,
            "allOf" => ConstraintType::AllOf,
            _ => return None,
        };
        Some(t)
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whether a constraint was written by the author or derived by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Manual,
    Generated,
}

/// Lower or upper numeric bound.
#[derive(Debug, Clone)]
pub struct Bound {
    pub value: Number,
    pub exclusive: bool,
}

impl Bound {
    pub fn new(value: Number) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }
}

/// One rule attached to a node.
#[derive(Debug, Clone)]
pub enum Constraint {
    Type(TypeConstraint),
    Nullable(bool),
    Optional(bool),
    Enum(EnumConstraint),
    Const(ConstConstraint),
    /// Marks a position whose alternatives are listed by `TypesList`
    Or(Source),
    TypesList(TypesList),
    /// Accepts any value; set by `type: "any"`
    Any,
    Min(Bound),
    Max(Bound),
    ExclusiveMinimum(bool),
    ExclusiveMaximum(bool),
    Precision(u32),
    MinLength(usize),
    MaxLength(usize),
    Regex(Regex),
    MinItems(usize),
    MaxItems(usize),
    Format(Format),
    AdditionalProperties(AdditionalProperties),
    /// Keys a document object must contain, in declaration order
    RequiredKeys(Vec<String>),
    AllOf(Vec<TypeRef>),
}

impl Constraint {
    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            Constraint::Type(_) => ConstraintType::Type,
            Constraint::Nullable(_) => ConstraintType::Nullable,
            Constraint::Optional(_) => ConstraintType::Optional,
            Constraint::Enum(_) => ConstraintType::Enum,
            Constraint::Const(_) => ConstraintType::Const,
            Constraint::Or(_) => ConstraintType::Or,
            Constraint::TypesList(_) => ConstraintType::TypesList,
            Constraint::Any => ConstraintType::Any,
            Constraint::Min(_) => ConstraintType::Min,
            Constraint::Max(_) => ConstraintType::Max,
            Constraint::ExclusiveMinimum(_) => ConstraintType::ExclusiveMinimum,
            Constraint::ExclusiveMaximum(_) => ConstraintType::ExclusiveMaximum,
            Constraint::Precision(_) => ConstraintType::Precision,
            Constraint::MinLength(_) => ConstraintType::MinLength,
            Constraint::MaxLength(_) => ConstraintType::MaxLength,
            Constraint::Regex(_) => ConstraintType::Regex,
            Constraint::MinItems(_) => ConstraintType::MinItems,
            Constraint::MaxItems(_) => ConstraintType::MaxItems,
            Constraint::Format(Format::Email) => ConstraintType::Email,
            Constraint::Format(Format::Uri) => ConstraintType::Uri,
            Constraint::Format(Format::Date) => ConstraintType::Date,
            Constraint::Format(Format::DateTime) => ConstraintType::DateTime,
            Constraint::Format(Format::Uuid) => ConstraintType::Uuid,
            Constraint::AdditionalProperties(_) => ConstraintType::AdditionalProperties,
            Constraint::RequiredKeys(_) => ConstraintType::RequiredKeys,
            Constraint::AllOf(_) => ConstraintType::AllOf,
        }
    }

    pub fn name(&self) -> &'static str {
        self.constraint_type().name()
    }

    pub fn source(&self) -> Source {
        match self {
            Constraint::Type(t) => t.source,
            Constraint::TypesList(list) => list.source,
            Constraint::Or(source) => *source,
            Constraint::Any | Constraint::Format(_) | Constraint::RequiredKeys(_) => {
                Source::Generated
            }
            _ => Source::Manual,
        }
    }

    /// Returns true if the constraint may be attached to a node of type `t`.
    pub fn is_json_type_compatible(&self, t: JsonType) -> bool {
        match self {
            Constraint::Type(_)
            | Constraint::Nullable(_)
            | Constraint::Optional(_)
            | Constraint::Or(_)
            | Constraint::TypesList(_)
            | Constraint::Any => true,
            Constraint::Enum(_) | Constraint::Const(_) => t.is_scalar(),
            Constraint::Min(_)
            | Constraint::Max(_)
            | Constraint::ExclusiveMinimum(_)
            | Constraint::ExclusiveMaximum(_) => t.is_number(),
            Constraint::Precision(_) => t == JsonType::Float,
            Constraint::MinLength(_)
            | Constraint::MaxLength(_)
            | Constraint::Regex(_)
            | Constraint::Format(_) => t == JsonType::String,
            Constraint::MinItems(_) | Constraint::MaxItems(_) => t == JsonType::Array,
            Constraint::AdditionalProperties(_)
            | Constraint::RequiredKeys(_)
            | Constraint::AllOf(_) => t == JsonType::Object,
        }
    }

    /// Checks a literal value against the rule.
    ///
    /// Rules for one JSON type ignore values of another; the JSON type
    /// itself is checked by the caller.
    pub fn validate(&self, value: &[u8]) -> SchemaResult<()> {
        let json_type = JsonType::of_literal(value);
        match self {
            Constraint::Min(bound) if json_type.is_number() => check_min(bound, value),
            Constraint::Max(bound) if json_type.is_number() => check_max(bound, value),
            Constraint::Precision(precision) if json_type.is_number() => {
                let number = number_of(value)?;
                if number.scale() > *precision {
                    return Err(violation(
                        "precision",
                        format!("more than {} digits after the decimal point", precision),
                    ));
                }
                Ok(())
            }
            Constraint::MinLength(min) if json_type == JsonType::String => {
                let length = unquote(value)?.chars().count();
                if length < *min {
                    return Err(violation(
                        "minLength",
                        format!("length {} is less than {}", length, min),
                    ));
                }
                Ok(())
            }
            Constraint::MaxLength(max) if json_type == JsonType::String => {
                let length = unquote(value)?.chars().count();
                if length > *max {
                    return Err(violation(
                        "maxLength",
                        format!("length {} is greater than {}", length, max),
                    ));
                }
                Ok(())
            }
            Constraint::Regex(regex) if json_type == JsonType::String => {
                if regex.is_match(&unquote(value)?) {
                    Ok(())
                } else {
                    Err(ErrorKind::DoesNotMatchRegularExpression.into())
                }
            }
            Constraint::Format(format) if json_type == JsonType::String => {
                if format.matches(&unquote(value)?) {
                    Ok(())
                } else {
                    Err(ErrorKind::InvalidFormat(format.name()).into())
                }
            }
            Constraint::Enum(rule) => rule.validate(value),
            Constraint::Const(rule) => rule.validate(value),
            _ => Ok(()),
        }
    }

    /// Returns the rule value as JSON, for export.
    pub fn rule_value(&self) -> Value {
        match self {
            Constraint::Type(t) => Value::String(t.name.clone()),
            Constraint::Nullable(b)
            | Constraint::Optional(b)
            | Constraint::ExclusiveMinimum(b)
            | Constraint::ExclusiveMaximum(b) => Value::Bool(*b),
            Constraint::Enum(rule) => Value::Array(
                rule.items()
                    .iter()
                    .map(|item| literal_value(item.lex.value()))
                    .collect(),
            ),
            Constraint::Const(rule) => Value::Bool(rule.apply),
            Constraint::Or(_) | Constraint::Any => Value::Bool(true),
            Constraint::TypesList(list) => names_value(&list.names),
            Constraint::AllOf(names) => names_value(names),
            Constraint::Min(bound) | Constraint::Max(bound) => literal_value(bound.value.to_string().as_bytes()),
            Constraint::Precision(n) => Value::from(*n),
            Constraint::MinLength(n)
            | Constraint::MaxLength(n)
            | Constraint::MinItems(n)
            | Constraint::MaxItems(n) => Value::from(*n),
            Constraint::Regex(regex) => Value::String(regex.as_str().to_string()),
            Constraint::Format(format) => Value::String(format.name().to_string()),
            Constraint::AdditionalProperties(ap) => match ap {
                AdditionalProperties::Allowed(b) => Value::Bool(*b),
                AdditionalProperties::Primitive(t) => Value::String(t.name().to_string()),
                AdditionalProperties::UserType(r) => Value::String(r.name.clone()),
            },
            Constraint::RequiredKeys(keys) => {
                Value::Array(keys.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.rule_value())
    }
}

fn violation(rule: &str, detail: String) -> crate::errors::SchemaError {
    ErrorKind::ConstraintValidation(rule.to_string(), detail).into()
}

fn number_of(value: &[u8]) -> SchemaResult<Number> {
    parse_number(value).ok_or_else(|| {
        ErrorKind::InvalidValueType(
            "number".to_string(),
            String::from_utf8_lossy(value).into_owned(),
        )
        .into()
    })
}

fn check_min(bound: &Bound, value: &[u8]) -> SchemaResult<()> {
    let number = number_of(value)?;
    if bound.exclusive && number <= bound.value {
        return Err(violation(
            "min",
            format!("value must be greater than {}", bound.value),
        ));
    }
    if number < bound.value {
        return Err(violation(
            "min",
            format!("value must be greater than or equal to {}", bound.value),
        ));
    }
    Ok(())
}

fn check_max(bound: &Bound, value: &[u8]) -> SchemaResult<()> {
    let number = number_of(value)?;
    if bound.exclusive && number >= bound.value {
        return Err(violation(
            "max",
            format!("value must be less than {}", bound.value),
        ));
    }
    if number > bound.value {
        return Err(violation(
            "max",
            format!("value must be less than or equal to {}", bound.value),
        ));
    }
    Ok(())
}

/// Literal text as a JSON value, falling back to the raw text.
fn literal_value(value: &[u8]) -> Value {
    serde_json::from_slice(value)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(value).into_owned()))
}

fn names_value(names: &[TypeRef]) -> Value {
    Value::Array(names.iter().map(|r| Value::String(r.name.clone())).collect())
}
