//! Rules with structured values: `or`, `enum` and `allOf`

use crate::constraint::values::string_value;
use crate::constraint::{
    check_user_type_name, is_user_type_name, Constraint, EnumConstraint, EnumItem, SchemaType,
    Source, TypeRef, TypesList,
};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::JsonType;
use crate::lexeme::LexEvent;
use crate::schema::{ArrayNode, Node, NodeId, NodeKind, ObjectNode, Schema};

use super::rule_loader::{RuleEntry, RuleValue};
use super::rules::{apply_rules, apply_type};

fn wrong_type(rule: &str, lex: &LexEvent) -> SchemaError {
    SchemaError::at_lex(ErrorKind::IncorrectRuleValueType(rule.to_string()), lex)
}

fn non_empty_array<'a>(rule: &str, value: &'a RuleValue) -> SchemaResult<&'a [RuleValue]> {
    match value {
        RuleValue::Array(items, lex) if items.is_empty() => Err(SchemaError::at_lex(
            ErrorKind::EmptyArrayInRule(rule.to_string()),
            lex,
        )),
        RuleValue::Array(items, _) => Ok(items),
        other => Err(wrong_type(rule, other.lex())),
    }
}

/// Loads the `or` rule.
///
/// Each alternative is a type name or a rule set with a `type` rule. Rule
/// sets become generated types named `#N`.
pub(crate) struct OrLoader;

impl OrLoader {
    pub fn apply(
        schema: &mut Schema,
        id: NodeId,
        value: &RuleValue,
        key_lex: &LexEvent,
    ) -> SchemaResult<()> {
        let items = non_empty_array("or", value)?;

        let mut names = Vec::with_capacity(items.len());
        for item in items {
            names.push(Self::alternative(schema, item)?);
        }

        let node = schema.node_mut(id);
        node.make_mixed();
        node.add_constraint(Constraint::Or(Source::Manual), key_lex)?;
        node.add_constraint(
            Constraint::TypesList(TypesList {
                names,
                source: Source::Manual,
            }),
            key_lex,
        )
    }

    fn alternative(schema: &mut Schema, item: &RuleValue) -> SchemaResult<TypeRef> {
        match item {
            RuleValue::Literal(lex) => {
                let name = string_value("or", lex.value()).map_err(|e| e.or_at(lex))?;
                if is_user_type_name(&name) {
                    return Ok(TypeRef::new(name, lex.clone()));
                }
                let id = generated_node(schema, &name, lex)?;
                apply_type(schema, id, item, lex)?;
                Self::register(schema, id, lex)
            }
            RuleValue::Object(entries, lex) => {
                let type_entry = entries
                    .iter()
                    .find(|e| e.key == "type")
                    .ok_or_else(|| SchemaError::at_lex(ErrorKind::OrItemWithoutType, lex))?;
                let name = type_name(type_entry)?;
                let id = generated_node(schema, &name, type_entry.value.lex())?;
                apply_rules(schema, id, entries)?;
                Self::register(schema, id, lex)
            }
            RuleValue::Array(_, lex) => Err(wrong_type("or", lex)),
        }
    }

    fn register(schema: &mut Schema, id: NodeId, lex: &LexEvent) -> SchemaResult<TypeRef> {
        let name = schema.register_generated_type(id, lex.file().clone())?;
        Ok(TypeRef::new(name, lex.clone()))
    }
}

fn type_name(entry: &RuleEntry) -> SchemaResult<String> {
    match &entry.value {
        RuleValue::Literal(lex) => string_value("type", lex.value()).map_err(|e| e.or_at(lex)),
        other => Err(wrong_type("type", other.lex())),
    }
}

/// Creates the node of an `or` alternative, shaped by its type name.
fn generated_node(schema: &mut Schema, type_name: &str, lex: &LexEvent) -> SchemaResult<NodeId> {
    let (kind, json_type) = match SchemaType::from_name(type_name) {
        Some(SchemaType::Object) => (NodeKind::Object(ObjectNode::default()), JsonType::Object),
        Some(SchemaType::Array) => (NodeKind::Array(ArrayNode::default()), JsonType::Array),
        Some(_) => (NodeKind::Literal, JsonType::String),
        None if is_user_type_name(type_name) => (NodeKind::Literal, JsonType::String),
        None => {
            return Err(SchemaError::at_lex(
                ErrorKind::UnknownSchemaType(type_name.to_string()),
                lex,
            ))
        }
    };
    Ok(schema.push_node(Node::generated(kind, json_type, lex.clone())))
}

/// Loads the `enum` rule: a non-empty array of distinct literals.
pub(crate) struct EnumLoader;

impl EnumLoader {
    pub fn load(value: &RuleValue) -> SchemaResult<EnumConstraint> {
        let mut rule = EnumConstraint::new();
        for item in non_empty_array("enum", value)? {
            match item {
                RuleValue::Literal(lex) => rule.push(EnumItem::new(lex.clone())?)?,
                other => return Err(wrong_type("enum", other.lex())),
            }
        }
        Ok(rule)
    }
}

/// Loads the `allOf` rule: one type name or an array of them.
pub(crate) struct AllOfLoader;

impl AllOfLoader {
    pub fn load(value: &RuleValue) -> SchemaResult<Vec<TypeRef>> {
        match value {
            RuleValue::Literal(_) => Ok(vec![Self::name(value)?]),
            RuleValue::Array(..) => non_empty_array("allOf", value)?
                .iter()
                .map(Self::name)
                .collect(),
            RuleValue::Object(_, lex) => Err(wrong_type("allOf", lex)),
        }
    }

    fn name(value: &RuleValue) -> SchemaResult<TypeRef> {
        match value {
            RuleValue::Literal(lex) => {
                let name = string_value("allOf", lex.value()).map_err(|e| e.or_at(lex))?;
                check_user_type_name(&name, lex)?;
                Ok(TypeRef::new(name, lex.clone()))
            }
            other => Err(wrong_type("allOf", other.lex())),
        }
    }
}
