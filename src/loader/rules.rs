//! Rule application
//!
//! Turns the entries of a rule set into constraints on one node. Rule
//! value errors are positioned on the value, name errors on the key.

use std::collections::HashSet;

use crate::constraint::values::{
    bool_value, count_value, number_value, precision_value, regex_value, string_value,
};
use crate::constraint::{
    is_user_type_name, AdditionalProperties, Bound, ConstConstraint, Constraint, ConstraintType,
    SchemaType, Source, TypeConstraint, TypeRef, TypesList,
};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::lexeme::LexEvent;
use crate::schema::{NodeId, NodeKind, Schema};

use super::embedded::{AllOfLoader, EnumLoader, OrLoader};
use super::rule_loader::{RuleEntry, RuleValue};

/// Applies a rule set to a node.
pub(crate) fn apply_rules(schema: &mut Schema, id: NodeId, entries: &[RuleEntry]) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.key.as_str()) {
            return Err(SchemaError::at_lex(
                ErrorKind::DuplicateRule(entry.key.clone()),
                &entry.key_lex,
            ));
        }
        apply_rule(schema, id, entry)?;
    }
    apply_exclusive_flags(schema, id);
    Ok(())
}

fn apply_rule(schema: &mut Schema, id: NodeId, entry: &RuleEntry) -> SchemaResult<()> {
    let name = entry.key.as_str();
    let t = ConstraintType::from_rule_name(name).ok_or_else(|| {
        SchemaError::at_lex(ErrorKind::UnknownRule(name.to_string()), &entry.key_lex)
    })?;
    let value = &entry.value;

    let constraint = match t {
        ConstraintType::Type => return apply_type(schema, id, value, &entry.key_lex),
        ConstraintType::Or => return OrLoader::apply(schema, id, value, &entry.key_lex),
        ConstraintType::Enum => Constraint::Enum(EnumLoader::load(value)?),
        ConstraintType::AllOf => Constraint::AllOf(AllOfLoader::load(value)?),
        ConstraintType::AdditionalProperties => {
            Constraint::AdditionalProperties(additional_properties(value)?)
        }
        ConstraintType::Const => {
            let apply = on_literal(value, name, bool_value)?;
            let node = schema.node(id);
            if !node.has_example() || !matches!(node.kind(), NodeKind::Literal) {
                return Err(SchemaError::at_lex(
                    ErrorKind::RuleRequiresExample(name.to_string()),
                    &entry.key_lex,
                ));
            }
            Constraint::Const(ConstConstraint::new(apply, node.value()))
        }
        ConstraintType::Nullable => Constraint::Nullable(on_literal(value, name, bool_value)?),
        ConstraintType::Optional => Constraint::Optional(on_literal(value, name, bool_value)?),
        ConstraintType::ExclusiveMinimum => {
            Constraint::ExclusiveMinimum(on_literal(value, name, bool_value)?)
        }
        ConstraintType::ExclusiveMaximum => {
            Constraint::ExclusiveMaximum(on_literal(value, name, bool_value)?)
        }
        ConstraintType::Min => Constraint::Min(Bound::new(on_literal(value, name, number_value)?)),
        ConstraintType::Max => Constraint::Max(Bound::new(on_literal(value, name, number_value)?)),
        ConstraintType::Precision => {
            Constraint::Precision(on_literal(value, name, |_, v| precision_value(v))?)
        }
        ConstraintType::MinLength => Constraint::MinLength(on_literal(value, name, count_value)?),
        ConstraintType::MaxLength => Constraint::MaxLength(on_literal(value, name, count_value)?),
        ConstraintType::MinItems => Constraint::MinItems(on_literal(value, name, count_value)?),
        ConstraintType::MaxItems => Constraint::MaxItems(on_literal(value, name, count_value)?),
        ConstraintType::Regex => Constraint::Regex(on_literal(value, name, |_, v| regex_value(v))?),
        _ => {
            return Err(SchemaError::at_lex(
                ErrorKind::UnknownRule(name.to_string()),
                &entry.key_lex,
            ))
        }
    };

    schema.node_mut(id).add_constraint(constraint, &entry.key_lex)
}

/// Parses a literal rule value, positioning failures on it.
fn on_literal<T>(
    value: &RuleValue,
    rule: &str,
    parse: impl FnOnce(&str, &[u8]) -> SchemaResult<T>,
) -> SchemaResult<T> {
    match value {
        RuleValue::Literal(lex) => parse(rule, lex.value()).map_err(|e| e.or_at(lex)),
        other => Err(SchemaError::at_lex(
            ErrorKind::IncorrectRuleValueType(rule.to_string()),
            other.lex(),
        )),
    }
}

/// Applies a `type` rule.
///
/// A user type name becomes a types list of one. Built-in names set the
/// node's JSON type and add the constraints the type implies.
pub(crate) fn apply_type(
    schema: &mut Schema,
    id: NodeId,
    value: &RuleValue,
    key_lex: &LexEvent,
) -> SchemaResult<()> {
    let name = on_literal(value, "type", string_value)?;
    let lex = value.lex().clone();
    let node = schema.node_mut(id);
    let rule = Constraint::Type(TypeConstraint {
        name: name.clone(),
        lex: lex.clone(),
        source: Source::Manual,
    });

    if is_user_type_name(&name) {
        node.add_constraint(rule, key_lex)?;
        node.add_constraint(
            Constraint::TypesList(TypesList {
                names: vec![TypeRef::new(name.clone(), lex)],
                source: Source::Manual,
            }),
            key_lex,
        )?;
        if !node.is_mixed() {
            node.set_schema_type(name);
        }
        return Ok(());
    }

    if name.starts_with('@') {
        return Err(SchemaError::at_lex(ErrorKind::InvalidTypeName(name), &lex));
    }
    let schema_type = SchemaType::from_name(&name)
        .ok_or_else(|| SchemaError::at_lex(ErrorKind::UnknownSchemaType(name.clone()), &lex))?;

    node.add_constraint(rule, key_lex)?;
    if matches!(node.kind(), NodeKind::MixedValue) {
        return Ok(());
    }
    node.set_schema_type(schema_type.name());

    match schema_type {
        SchemaType::Any => node.add_constraint(Constraint::Any, key_lex)?,
        _ => {
            if let Some(json_type) = schema_type.json_type() {
                node.set_json_type(json_type);
            }
        }
    }
    if let Some(format) = schema_type.format() {
        node.add_constraint(Constraint::Format(format), key_lex)?;
    }
    Ok(())
}

fn additional_properties(value: &RuleValue) -> SchemaResult<AdditionalProperties> {
    const RULE: &str = "additionalProperties";
    let lex = match value {
        RuleValue::Literal(lex) => lex,
        other => {
            return Err(SchemaError::at_lex(
                ErrorKind::IncorrectRuleValueType(RULE.to_string()),
                other.lex(),
            ))
        }
    };

    if let Ok(allowed) = bool_value(RULE, lex.value()) {
        return Ok(AdditionalProperties::Allowed(allowed));
    }
    let name = string_value(RULE, lex.value()).map_err(|e| e.or_at(lex))?;
    if is_user_type_name(&name) {
        return Ok(AdditionalProperties::UserType(TypeRef::new(name, lex.clone())));
    }
    SchemaType::from_name(&name)
        .map(AdditionalProperties::Primitive)
        .ok_or_else(|| SchemaError::at_lex(ErrorKind::UnknownSchemaType(name), lex))
}

/// Folds `exclusiveMinimum`/`exclusiveMaximum` into the bounds they modify.
///
/// A flag without its bound stays on the node for the checker to report.
fn apply_exclusive_flags(schema: &mut Schema, id: NodeId) {
    let node = schema.node_mut(id);
    if matches!(
        node.constraint(ConstraintType::ExclusiveMinimum),
        Some(Constraint::ExclusiveMinimum(true))
    ) {
        if let Some(Constraint::Min(bound)) = node.constraint_mut(ConstraintType::Min) {
            bound.exclusive = true;
        }
    }
    if matches!(
        node.constraint(ConstraintType::ExclusiveMaximum),
        Some(Constraint::ExclusiveMaximum(true))
    ) {
        if let Some(Constraint::Max(bound)) = node.constraint_mut(ConstraintType::Max) {
            bound.exclusive = true;
        }
    }
}
