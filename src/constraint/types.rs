//! Type rules: built-in schema types, type references and the constraints
//! built around them

use std::fmt;

use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::JsonType;
use crate::lexeme::LexEvent;

use super::format::Format;
use super::Source;

/// Built-in type names accepted by the `type` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Object,
    Array,
    Null,
    Email,
    Uri,
    Date,
    DateTime,
    Uuid,
    Enum,
    Mixed,
    Any,
}

impl SchemaType {
    pub fn from_name(name: &str) -> Option<SchemaType> {
        let t = match name {
            "string" => SchemaType::String,
            "integer" => SchemaType::Integer,
            "float" => SchemaType::Float,
            "decimal" => SchemaType::Decimal,
            "boolean" => SchemaType::Boolean,
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            "null" => SchemaType::Null,
            "email" => SchemaType::Email,
            "uri" => SchemaType::Uri,
            "date" => SchemaType::Date,
            "datetime" => SchemaType::DateTime,
            "uuid" => SchemaType::Uuid,
            "enum" => SchemaType::Enum,
            "mixed" => SchemaType::Mixed,
            "any" => SchemaType::Any,
            _ => return None,
        };
        Some(t)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Float => "float",
            SchemaType::Decimal => "decimal",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Null => "null",
            SchemaType::Email => "email",
            SchemaType::Uri => "uri",
            SchemaType::Date => "date",
            SchemaType::DateTime => "datetime",
            SchemaType::Uuid => "uuid",
            SchemaType::Enum => "enum",
            SchemaType::Mixed => "mixed",
            SchemaType::Any => "any",
        }
    }

    /// JSON type implied by the schema type.
    ///
    /// `enum` and `any` do not imply one: the example value decides.
    pub fn json_type(&self) -> Option<JsonType> {
        match self {
            SchemaType::String
            | SchemaType::Email
            | SchemaType::Uri
            | SchemaType::Date
            | SchemaType::DateTime
            | SchemaType::Uuid => Some(JsonType::String),
            SchemaType::Integer => Some(JsonType::Integer),
            SchemaType::Float | SchemaType::Decimal => Some(JsonType::Float),
            SchemaType::Boolean => Some(JsonType::Boolean),
            SchemaType::Object => Some(JsonType::Object),
            SchemaType::Array => Some(JsonType::Array),
            SchemaType::Null => Some(JsonType::Null),
            SchemaType::Mixed => Some(JsonType::Mixed),
            SchemaType::Enum | SchemaType::Any => None,
        }
    }

    /// String format checked in addition to the JSON type.
    pub fn format(&self) -> Option<Format> {
        match self {
            SchemaType::Email => Some(Format::Email),
            SchemaType::Uri => Some(Format::Uri),
            SchemaType::Date => Some(Format::Date),
            SchemaType::DateTime => Some(Format::DateTime),
            SchemaType::Uuid => Some(Format::Uuid),
            _ => None,
        }
    }
}

/// Returns true for `@name` user type names.
pub fn is_user_type_name(name: &str) -> bool {
    match name.strip_prefix('@') {
        Some(rest) => {
            !rest.is_empty()
                && rest
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        }
        None => false,
    }
}

/// Validates a user type name, positioning a failure at `lex`.
pub fn check_user_type_name(name: &str, lex: &LexEvent) -> SchemaResult<()> {
    if is_user_type_name(name) {
        Ok(())
    } else {
        Err(SchemaError::at_lex(
            ErrorKind::InvalidTypeName(name.to_string()),
            lex,
        ))
    }
}

/// Named reference to a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    /// Where the name was written
    pub lex: LexEvent,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, lex: LexEvent) -> Self {
        Self {
            name: name.into(),
            lex,
        }
    }
}

/// The `type` rule.
#[derive(Debug, Clone)]
pub struct TypeConstraint {
    /// Built-in type name or `@name`
    pub name: String,
    pub lex: LexEvent,
    pub source: Source,
}

impl TypeConstraint {
    /// Returns the built-in type, or `None` for a user type reference.
    pub fn schema_type(&self) -> Option<SchemaType> {
        SchemaType::from_name(&self.name)
    }

    pub fn is_reference(&self) -> bool {
        is_user_type_name(&self.name)
    }
}

/// Names of the types a position may take, in declaration order.
///
/// Written by the `type` rule when it names a user type, by `or` and by
/// shortcuts.
#[derive(Debug, Clone)]
pub struct TypesList {
    pub names: Vec<TypeRef>,
    pub source: Source,
}

impl TypesList {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|r| r.name == name)
    }
}

/// What an object accepts for keys it does not declare.
#[derive(Debug, Clone)]
pub enum AdditionalProperties {
    /// `true` accepts anything, `false` nothing
    Allowed(bool),
    /// Values must be of a built-in type
    Primitive(SchemaType),
    /// Values must match a user type
    UserType(TypeRef),
}

impl AdditionalProperties {
    /// Returns true if the two settings accept the same values.
    pub fn same_as(&self, other: &AdditionalProperties) -> bool {
        match (self, other) {
            (AdditionalProperties::Allowed(a), AdditionalProperties::Allowed(b)) => a == b,
            (AdditionalProperties::Primitive(a), AdditionalProperties::Primitive(b)) => a == b,
            (AdditionalProperties::UserType(a), AdditionalProperties::UserType(b)) => {
                a.name == b.name
            }
            _ => false,
        }
    }
}

impl fmt::Display for AdditionalProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdditionalProperties::Allowed(allowed) => write!(f, "{}", allowed),
            AdditionalProperties::Primitive(t) => write!(f, "{:?}", t.name()),
            AdditionalProperties::UserType(r) => write!(f, "{:?}", r.name),
        }
    }
}
