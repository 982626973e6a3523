//! Schema consistency check
//!
//! Runs once the schema is loaded and compiled, before documents are
//! validated. Every node reachable from the root example and from every
//! registered type is visited once, depth first.
//!
//! # Per-node checks, in order
//!
//! 1. Rule exclusivity (`enum`, `or`, `any`, type references)
//! 2. Rule and JSON type compatibility
//! 3. Rule pairs (`exclusiveMinimum` needs `min`, `min <= max`, ...)
//! 4. Built-in types that need a rule (`mixed`, `enum`, `decimal`)
//! 5. Type references resolve, without recursion, to types the example fits
//! 6. The example satisfies the rules of at least one alternative
//! 7. Positions described elsewhere hold no children of their own
//! 8. Key shortcuts and `additionalProperties` name existing types
//!
//! Checking is read-only and may be repeated.

use std::collections::HashSet;

use crate::constraint::{AdditionalProperties, Constraint, ConstraintType};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::JsonType;
use crate::observability::Logger;
use crate::schema::{Node, NodeId, NodeKind, Schema};
use crate::validator::{check_example, json_type_of};

/// Rules that may accompany any other rule.
const ALWAYS_ALLOWED: [ConstraintType; 4] = [
    ConstraintType::Type,
    ConstraintType::Optional,
    ConstraintType::Nullable,
    ConstraintType::RequiredKeys,
];

/// Checks the whole schema.
pub(crate) fn check(schema: &Schema, logger: &dyn Logger) -> SchemaResult<()> {
    let nodes = schema.node_count().to_string();
    let types = schema.types().count().to_string();
    logger.info("CHECK_START", &[("nodes", &nodes), ("types", &types)]);

    let mut checker = Checker {
        schema,
        logger,
        visited: HashSet::new(),
    };
    let result = checker.run();
    match &result {
        Ok(()) => logger.info("CHECK_OK", &[("nodes", &checker.visited.len().to_string())]),
        Err(err) => logger.error(
            "CHECK_FAILED",
            &[("code", &err.code().to_string()), ("message", &err.message())],
        ),
    }
    result
}

struct Checker<'s> {
    schema: &'s Schema,
    logger: &'s dyn Logger,
    visited: HashSet<NodeId>,
}

impl<'s> Checker<'s> {
    fn run(&mut self) -> SchemaResult<()> {
        if let Some(root) = self.schema.root() {
            self.check_tree(root)?;
        }
        let roots: Vec<(String, NodeId)> = self
            .schema
            .types()
            .map(|t| (t.name.clone(), t.root))
            .collect();
        for (name, root) in roots {
            self.logger.default("CHECK_TYPE", &[("type", &name)]);
            self.check_tree(root)?;
        }
        Ok(())
    }

    fn check_tree(&mut self, id: NodeId) -> SchemaResult<()> {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if !self.visited.insert(id) {
                continue;
            }
            let node = self.schema.node(id);
            self.logger.default(
                "CHECK_NODE",
                &[("node", &id.to_string()), ("kind", node.kind().name())],
            );
            check_node(self.schema, id, node)?;
            stack.extend(node.children().into_iter().rev());
        }
        Ok(())
    }
}

fn check_node(schema: &Schema, id: NodeId, node: &Node) -> SchemaResult<()> {
    check_exclusivity(node)?;
    check_compatibility(node)?;
    check_pairs(node)?;
    check_type_requirements(node)?;
    check_type_references(schema, id, node)?;
    check_basis(schema, id, node)?;
    check_children(node)?;
    check_empty_array(schema, node)?;
    check_key_shortcuts(schema, node)?;
    check_additional_properties(schema, node)
}

// ==================
// Rules
// ==================

fn check_exclusivity(node: &Node) -> SchemaResult<()> {
    let (allowed, kind): (&[ConstraintType], ErrorKind) = if node.has(ConstraintType::Enum) {
        (
            &[ConstraintType::Enum],
            ErrorKind::ShouldBeNoOtherRulesInSetWithEnum,
        )
    } else if node.has(ConstraintType::Or) {
        (
            &[ConstraintType::Or, ConstraintType::TypesList],
            ErrorKind::ShouldBeNoOtherRulesInSetWithOr,
        )
    } else if node.has(ConstraintType::Any) {
        (
            &[ConstraintType::Any, ConstraintType::Precision],
            ErrorKind::ShouldBeNoOtherRulesInSetWithAny,
        )
    } else if node.is_type_reference() {
        (
            &[ConstraintType::TypesList, ConstraintType::Precision],
            ErrorKind::CannotSpecifyOtherRulesWithTypeReference,
        )
    } else {
        return Ok(());
    };

    let extra = node
        .constraints()
        .keys()
        .any(|t| !ALWAYS_ALLOWED.contains(t) && !allowed.contains(t));
    if extra {
        return Err(SchemaError::at_lex(kind, node.lex()));
    }
    Ok(())
}

fn check_compatibility(node: &Node) -> SchemaResult<()> {
    if node.is_mixed() {
        return Ok(());
    }
    for constraint in node.constraints().values() {
        if !constraint.is_json_type_compatible(node.json_type()) {
            return Err(SchemaError::at_lex(
                ErrorKind::UnexpectedConstraint(
                    constraint.name().to_string(),
                    node.schema_type().to_string(),
                ),
                node.lex(),
            ));
        }
    }
    Ok(())
}

fn check_pairs(node: &Node) -> SchemaResult<()> {
    let fail = |kind: ErrorKind| Err(SchemaError::at_lex(kind, node.lex()));

    if node.has(ConstraintType::ExclusiveMinimum) && !node.has(ConstraintType::Min) {
        return fail(ErrorKind::ConstraintMinNotFound);
    }
    if node.has(ConstraintType::ExclusiveMaximum) && !node.has(ConstraintType::Max) {
        return fail(ErrorKind::ConstraintMaxNotFound);
    }

    if let (Some(Constraint::Min(min)), Some(Constraint::Max(max))) = (
        node.constraint(ConstraintType::Min),
        node.constraint(ConstraintType::Max),
    ) {
        if min.value > max.value {
            return fail(ErrorKind::ValueOfOneConstraintGreaterThanAnother("min", "max"));
        }
    }
    if let (Some(Constraint::MinLength(min)), Some(Constraint::MaxLength(max))) = (
        node.constraint(ConstraintType::MinLength),
        node.constraint(ConstraintType::MaxLength),
    ) {
        if min > max {
            return fail(ErrorKind::ValueOfOneConstraintGreaterThanAnother(
                "minLength",
                "maxLength",
            ));
        }
    }
    if let (Some(Constraint::MinItems(min)), Some(Constraint::MaxItems(max))) = (
        node.constraint(ConstraintType::MinItems),
        node.constraint(ConstraintType::MaxItems),
    ) {
        if min > max {
            return fail(ErrorKind::ValueOfOneConstraintGreaterThanAnother(
                "minItems",
                "maxItems",
            ));
        }
    }
    Ok(())
}

fn check_type_requirements(node: &Node) -> SchemaResult<()> {
    let kind = match node.schema_type() {
        "mixed" if !node.has(ConstraintType::Or) => ErrorKind::MixedTypeRequiresOr,
        "enum" if !node.has(ConstraintType::Enum) => ErrorKind::EnumTypeRequiresEnumRule,
        "decimal" if !node.has(ConstraintType::Precision) => ErrorKind::DecimalRequiresPrecision,
        _ => return Ok(()),
    };
    Err(SchemaError::at_lex(kind, node.lex()))
}

// ==================
// Types
// ==================

/// The example of a type reference must be of a JSON type the named types
/// can take.
fn check_type_references(schema: &Schema, id: NodeId, node: &Node) -> SchemaResult<()> {
    let list = match node.types_list() {
        Some(list) => list,
        None => return Ok(()),
    };
    for r in &list.names {
        schema.resolve_type(r)?;
    }
    let union = schema.json_types(id)?;

    if !node.has_example() || node.is_mixed() || union.contains(&JsonType::Mixed) {
        return Ok(());
    }
    let example = json_type_of(node.lex());
    if union.iter().any(|t| t.accepts(example)) {
        return Ok(());
    }
    let names: Vec<&str> = list.names.iter().map(|r| r.name.as_str()).collect();
    Err(SchemaError::at_lex(
        ErrorKind::IncorrectUserType(names.join(" | ")),
        node.lex(),
    ))
}

/// The example must be accepted by at least one alternative.
fn check_basis(schema: &Schema, id: NodeId, node: &Node) -> SchemaResult<()> {
    if !node.has_example() || matches!(node.kind(), NodeKind::MixedValue) {
        return Ok(());
    }
    let targets = schema.targets(id)?;
    check_example(schema, &targets, node.lex()).map_err(|e| e.or_at(node.lex()))
}

fn check_children(node: &Node) -> SchemaResult<()> {
    if node.children().is_empty() {
        return Ok(());
    }
    let described_by = if node.has(ConstraintType::Or) {
        "the \"or\" rule"
    } else if node.has(ConstraintType::Any) {
        "the \"any\" type"
    } else if node.has(ConstraintType::TypesList) {
        "a type reference"
    } else {
        return Ok(());
    };
    Err(SchemaError::at_lex(
        ErrorKind::InvalidChildNodeTogetherWithTypeReference(described_by),
        node.lex(),
    ))
}

/// An empty array example that refers to a type only fits types that
/// accept any items themselves.
fn check_empty_array(schema: &Schema, node: &Node) -> SchemaResult<()> {
    match node.array() {
        Some(array) if array.is_empty() => {}
        _ => return Ok(()),
    }
    let list = match node.types_list() {
        Some(list) => list,
        None => return Ok(()),
    };
    let mut chain = Vec::new();
    for r in &list.names {
        if !accepts_any_items(schema, schema.resolve_type(r)?, &mut chain)? {
            return Err(SchemaError::at_lex(
                ErrorKind::IncorrectUserType(r.name.clone()),
                node.lex(),
            ));
        }
    }
    Ok(())
}

fn accepts_any_items(schema: &Schema, id: NodeId, chain: &mut Vec<String>) -> SchemaResult<bool> {
    let node = schema.node(id);
    if node.has(ConstraintType::Any) {
        return Ok(true);
    }
    if let Some(list) = node.types_list() {
        for r in &list.names {
            if chain.contains(&r.name) {
                return Err(SchemaError::at_lex(
                    ErrorKind::ImpossibleToDetermineTheJsonTypeDueToRecursion(r.name.clone()),
                    &r.lex,
                ));
            }
            chain.push(r.name.clone());
            let accepted = accepts_any_items(schema, schema.resolve_type(r)?, chain)?;
            chain.pop();
            if !accepted {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    Ok(node.array().map_or(false, |array| array.is_empty()))
}

fn check_key_shortcuts(schema: &Schema, node: &Node) -> SchemaResult<()> {
    let object = match node.object() {
        Some(object) => object,
        None => return Ok(()),
    };
    for key in object.shortcut_keys() {
        let root = schema.type_root(&key.name).ok_or_else(|| {
            SchemaError::at_lex(ErrorKind::TypeNotFound(key.name.clone()), &key.lex)
        })?;
        let types = schema
            .json_types(root)
            .map_err(|e| e.reposition(&key.lex))?;
        if !(types.contains(&JsonType::String) || types.contains(&JsonType::Mixed)) {
            return Err(SchemaError::at_lex(
                ErrorKind::IncorrectUserType(key.name.clone()),
                &key.lex,
            ));
        }
    }
    Ok(())
}

fn check_additional_properties(schema: &Schema, node: &Node) -> SchemaResult<()> {
    if let Some(Constraint::AdditionalProperties(AdditionalProperties::UserType(r))) =
        node.constraint(ConstraintType::AdditionalProperties)
    {
        schema.resolve_type(r)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::observability::{MemoryLogger, NopLogger};
    use crate::source::SourceFile;

    fn check_text(text: &str) -> SchemaResult<()> {
        let mut schema = Schema::load(SourceFile::new("schema", text))?;
        schema.compile(&CompileOptions::default())?;
        schema.check(&NopLogger)
    }

    fn check_code(text: &str) -> u16 {
        check_text(text).unwrap_err().code()
    }

    fn with_types(types: &[(&str, &str)], root: &str) -> SchemaResult<()> {
        let mut schema = Schema::new();
        for (name, text) in types {
            schema.add_type(name, SourceFile::new(*name, *text))?;
        }
        schema.load_root(SourceFile::new("root", root))?;
        schema.compile(&CompileOptions::default())?;
        schema.check(&NopLogger)
    }

    #[test]
    fn test_valid_schema() {
        let text = "{\n  \"id\": 1, // {min: 1}\n  \"tags\": [\n    \"a\" // {maxLength: 5}\n  ],\n  \"price\": 1.25 // {precision: 2}\n}";
        assert!(check_text(text).is_ok());
    }

    #[test]
    fn test_enum_is_exclusive() {
        assert!(check_text("\"white\" // {enum: [\"white\", \"black\"]}").is_ok());
        assert_eq!(
            check_code("\"white\" // {enum: [\"white\", \"black\"], min: 0}"),
            1402
        );
    }

    #[test]
    fn test_or_is_exclusive() {
        assert!(check_text("1 // {or: [\"integer\", \"string\"]}").is_ok());
        assert_eq!(
            check_code("1 // {or: [\"integer\", \"string\"], min: 0}"),
            1403
        );
    }

    #[test]
    fn test_any_allows_precision_only() {
        assert!(check_text("1.5 // {type: \"any\", precision: 2}").is_ok());
        assert_eq!(check_code("\"x\" // {type: \"any\", precision: 2}"), 1401);
        assert_eq!(check_code("\"x\" // {type: \"any\", minLength: 1}"), 1404);
    }

    #[test]
    fn test_type_reference_is_exclusive() {
        let result = with_types(&[("@id", "1")], "2 // {type: \"@id\", min: 1}");
        assert_eq!(result.unwrap_err().code(), 1405);
        assert!(with_types(&[("@id", "1")], "2 // {type: \"@id\", optional: true}").is_ok());
    }

    #[test]
    fn test_incompatible_rule() {
        let err = check_text("\"abc\" // {min: 1}").unwrap_err();
        assert_eq!(err.code(), 1401);
        assert!(err.message().contains("\"min\""));
        assert!(err.message().contains("\"string\""));
    }

    #[test]
    fn test_rule_pairs() {
        assert_eq!(check_code("5 // {exclusiveMinimum: true}"), 1407);
        assert_eq!(check_code("5 // {exclusiveMaximum: true}"), 1408);
        assert_eq!(check_code("5 // {min: 10, max: 1}"), 1416);
        assert_eq!(check_code("\"abc\" // {minLength: 5, maxLength: 1}"), 1416);
    }

    #[test]
    fn test_type_requirements() {
        assert_eq!(check_code("\"a\" // {type: \"mixed\"}"), 1413);
        assert_eq!(check_code("1.5 // {type: \"decimal\"}"), 1415);
        assert!(check_text("1.5 // {type: \"decimal\", precision: 2}").is_ok());
    }

    #[test]
    fn test_example_must_satisfy_rules() {
        let err = check_text("{\n  \"id\": 5 // {min: 10}\n}").unwrap_err();
        assert_eq!(err.code(), 1502);
        assert_eq!(err.line(), Some(2));
        assert_eq!(check_code("\"x\" // {or: [\"integer\", \"boolean\"]}"), 1412);
    }

    #[test]
    fn test_reference_must_fit_example() {
        let result = with_types(&[("@cat", "{\"name\": \"Tom\"}")], "\"x\" // {type: \"@cat\"}");
        assert_eq!(result.unwrap_err().code(), 1411);

        let result = with_types(&[("@id", "1")], "2 // {type: \"@missing\"}");
        assert_eq!(result.unwrap_err().code(), 1409);
    }

    #[test]
    fn test_reference_recursion() {
        let result = with_types(&[("@a", "@b"), ("@b", "@a")], "@a");
        assert_eq!(result.unwrap_err().code(), 1410);

        let list = "{\n  \"value\": 1,\n  \"next\": @node // {nullable: true}\n}";
        assert!(with_types(&[("@node", list)], "@node").is_ok());
    }

    #[test]
    fn test_children_with_type_reference() {
        let result = with_types(
            &[("@cat", "{\"name\": \"Tom\"}")],
            "{ // {type: \"@cat\"}\n  \"name\": \"Tom\"\n}",
        );
        let err = result.unwrap_err();
        assert_eq!(err.code(), 1406);
        assert!(err.message().contains("type reference"));
    }

    #[test]
    fn test_empty_array_reference() {
        assert!(with_types(&[("@list", "[]")], "[] // {type: \"@list\"}").is_ok());
        let result = with_types(&[("@list", "[1]")], "[] // {type: \"@list\"}");
        assert_eq!(result.unwrap_err().code(), 1411);
    }

    #[test]
    fn test_key_shortcut_must_exist() {
        let err = with_types(&[], "{\n  @id: 1\n}").unwrap_err();
        assert_eq!(err.code(), 1409);
        assert_eq!(err.line(), Some(2));

        let ok = with_types(&[("@id", "\"abc\" // {regex: \"^[a-z]+$\"}")], "{\n  @id: 1\n}");
        assert!(ok.is_ok());
        let not_string = with_types(&[("@id", "1")], "{\n  @id: 1\n}");
        assert_eq!(not_string.unwrap_err().code(), 1411);
    }

    #[test]
    fn test_check_is_repeatable() {
        let mut schema = Schema::load(SourceFile::anonymous("[\n  1 // {min: 0}\n]")).unwrap();
        schema.compile(&CompileOptions::default()).unwrap();
        let logger = MemoryLogger::new();
        assert!(schema.check(&logger).is_ok());
        assert!(schema.check(&logger).is_ok());
        assert_eq!(logger.events("CHECK_OK").len(), 2);
        assert!(!logger.events("CHECK_NODE").is_empty());
    }
}
