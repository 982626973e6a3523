//! Literal validation
//!
//! Checks one literal value against a node's JSON type and rules, and
//! against the flattened alternatives of a node.

use crate::constraint::{Constraint, ConstraintType};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::JsonType;
use crate::lexeme::{LexEvent, LexEventType};
use crate::schema::{Node, NodeId, NodeKind, Schema, Target};

/// JSON type of the value an event covers.
pub(crate) fn json_type_of(lex: &LexEvent) -> JsonType {
    match lex.kind() {
        LexEventType::ObjectBegin | LexEventType::ObjectEnd => JsonType::Object,
        LexEventType::ArrayBegin | LexEventType::ArrayEnd => JsonType::Array,
        LexEventType::MixedValueBegin | LexEventType::MixedValueEnd => JsonType::Mixed,
        _ => JsonType::of_literal(lex.value()),
    }
}

pub(crate) fn invalid_type(expected: JsonType, actual: JsonType) -> SchemaError {
    ErrorKind::InvalidValueType(expected.to_string(), actual.to_string()).into()
}

/// Validates a literal against the JSON type and the rules of one node.
///
/// `null` passes a nullable node. A node with an `enum` rule has no JSON
/// type of its own: membership decides.
pub fn validate_literal_value(node: &Node, value: &[u8]) -> SchemaResult<()> {
    let actual = JsonType::of_literal(value);
    let null_allowed = actual == JsonType::Null && node.is_nullable();

    if !node.has(ConstraintType::Enum) {
        let expected = node.json_type();
        if !(expected.accepts(actual) || expected == JsonType::Mixed || null_allowed) {
            return Err(invalid_type(expected, actual));
        }
    }

    let mut constraints: Vec<&Constraint> = node.constraints().values().collect();
    constraints.sort_by_key(|c| c.constraint_type());
    for constraint in constraints {
        if null_allowed && matches!(constraint, Constraint::Enum(_) | Constraint::Const(_)) {
            continue;
        }
        constraint.validate(value)?;
    }
    Ok(())
}

/// Validates a literal against every alternative a node stands for.
///
/// One accepting alternative is enough.
pub fn validate_literal_value2(schema: &Schema, id: NodeId, value: &[u8]) -> SchemaResult<()> {
    let targets = schema.targets(id)?;
    any_of(targets.iter().map(|target| literal_against(schema, *target, value)))
}

fn literal_against(schema: &Schema, target: Target, value: &[u8]) -> SchemaResult<()> {
    let actual = JsonType::of_literal(value);
    match target {
        Target::Any => Ok(()),
        Target::Null if actual == JsonType::Null => Ok(()),
        Target::Null => Err(invalid_type(JsonType::Null, actual)),
        Target::Node(id) => {
            let node = schema.node(id);
            match node.kind() {
                NodeKind::Object(_) | NodeKind::Array(_) => Err(invalid_type(node.json_type(), actual)),
                _ => validate_literal_value(node, value),
            }
        }
    }
}

/// Checks the example value covered by `lex` against the alternatives.
///
/// Objects and arrays are only checked for their kind; their children are
/// checked on their own.
pub(crate) fn check_example(schema: &Schema, targets: &[Target], lex: &LexEvent) -> SchemaResult<()> {
    any_of(targets.iter().map(|target| example_against(schema, *target, lex)))
}

fn example_against(schema: &Schema, target: Target, lex: &LexEvent) -> SchemaResult<()> {
    let actual = json_type_of(lex);
    match target {
        Target::Any => Ok(()),
        Target::Null if actual == JsonType::Null => Ok(()),
        Target::Null => Err(invalid_type(JsonType::Null, actual)),
        Target::Node(id) => {
            let node = schema.node(id);
            match node.kind() {
                NodeKind::Object(_) | NodeKind::Array(_) if node.json_type() == actual => Ok(()),
                NodeKind::Object(_) | NodeKind::Array(_) => Err(invalid_type(node.json_type(), actual)),
                _ if matches!(actual, JsonType::Object | JsonType::Array) => {
                    Err(invalid_type(node.json_type(), actual))
                }
                _ => validate_literal_value(node, lex.value()),
            }
        }
    }
}

/// Succeeds if any result does; otherwise reports the only failure, or an
/// `or` failure when there were several alternatives.
pub(crate) fn any_of(results: impl Iterator<Item = SchemaResult<()>>) -> SchemaResult<()> {
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(()) => return Ok(()),
            Err(err) => failures.push(err),
        }
    }
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(ErrorKind::OrRuleSetValidation.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;

    fn schema(text: &str) -> Schema {
        Schema::load(SourceFile::anonymous(text)).unwrap()
    }

    fn root_check(text: &str, value: &str) -> SchemaResult<()> {
        let schema = schema(text);
        validate_literal_value(schema.node(schema.root().unwrap()), value.as_bytes())
    }

    #[test]
    fn test_json_type_check() {
        assert!(root_check("1", "42").is_ok());
        assert_eq!(root_check("1", "\"a\"").unwrap_err().code(), 1501);
        assert!(root_check("1.5", "2").is_ok());
        assert_eq!(root_check("1", "2.5").unwrap_err().code(), 1501);
    }

    #[test]
    fn test_nullable() {
        assert_eq!(root_check("\"a\"", "null").unwrap_err().code(), 1501);
        assert!(root_check("\"a\" // {nullable: true, minLength: 3}", "null").is_ok());
        assert!(root_check("\"a\" // {nullable: true, enum: [\"a\"]}", "null").is_ok());
    }

    #[test]
    fn test_enum_replaces_json_type() {
        let text = "\"white\" // {enum: [\"white\", 1]}";
        assert!(root_check(text, "1").is_ok());
        assert_eq!(root_check(text, "2").unwrap_err().code(), 1508);
    }

    #[test]
    fn test_rules_run_in_type_order() {
        let text = "\"abc\" // {regex: \"^[a-z]+$\", maxLength: 3}";
        let err = root_check(text, "\"ABCD\"").unwrap_err();
        assert_eq!(err.code(), 1502);
        assert!(err.message().contains("maxLength"));
    }

    #[test]
    fn test_literal_against_alternatives() {
        let schema = schema("1 // {or: [\"integer\", {type: \"string\", maxLength: 2}]}");
        let root = schema.root().unwrap();
        assert!(validate_literal_value2(&schema, root, b"5").is_ok());
        assert!(validate_literal_value2(&schema, root, b"\"ab\"").is_ok());
        assert_eq!(
            validate_literal_value2(&schema, root, b"\"abc\"").unwrap_err().code(),
            1412
        );
    }

    #[test]
    fn test_any_of_reports_single_failure() {
        let single = any_of(vec![Err(ErrorKind::UnexpectedArrayItem.into())].into_iter());
        assert_eq!(single.unwrap_err().code(), 1506);
        assert!(any_of(Vec::new().into_iter()).is_ok());
    }
}
