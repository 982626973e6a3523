//! Validation leaves
//!
//! A leaf follows one document value against one schema alternative. It is
//! fed the value's events in order and answers with a [`Step`].

use std::collections::HashSet;

use crate::constraint::{AdditionalProperties, Constraint, ConstraintType, SchemaType};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::{unquote, JsonType};
use crate::lexeme::{LexEvent, LexEventType};
use crate::schema::{NodeId, NodeKind, Schema, Target};

use super::literal::{invalid_type, json_type_of, validate_literal_value, validate_literal_value2};

/// What a leaf wants after consuming an event.
pub(crate) enum Step {
    Continue,
    /// A nested value starts; each leaf is one alternative for it
    Spawn(Vec<LeafKind>),
    Done,
}

/// State of one leaf.
pub(crate) enum LeafKind {
    Literal(NodeId),
    Object(ObjectLeaf),
    Array(ArrayLeaf),
    Null,
    /// Any value; when `expected` is set, only of that JSON type
    Any { depth: usize, expected: Option<JsonType> },
    /// Scalar of a built-in type, used for `additionalProperties`
    Primitive(SchemaType),
}

/// Creates the leaves for every alternative of a node.
pub(crate) fn leaves_for(schema: &Schema, id: NodeId) -> SchemaResult<Vec<LeafKind>> {
    Ok(schema
        .targets(id)?
        .into_iter()
        .map(|target| LeafKind::from_target(schema, target))
        .collect())
}

impl LeafKind {
    fn from_target(schema: &Schema, target: Target) -> LeafKind {
        match target {
            Target::Any => LeafKind::any(None),
            Target::Null => LeafKind::Null,
            Target::Node(id) => match schema.node(id).kind() {
                NodeKind::Object(_) => LeafKind::Object(ObjectLeaf::new(schema, id)),
                NodeKind::Array(_) => LeafKind::Array(ArrayLeaf::new(id)),
                NodeKind::Literal => LeafKind::Literal(id),
                NodeKind::Mixed | NodeKind::MixedValue => LeafKind::any(None),
            },
        }
    }

    fn any(expected: Option<JsonType>) -> LeafKind {
        LeafKind::Any { depth: 0, expected }
    }

    fn primitive(schema_type: SchemaType) -> LeafKind {
        match schema_type.json_type() {
            Some(t @ (JsonType::Object | JsonType::Array)) => LeafKind::any(Some(t)),
            Some(JsonType::Mixed) | None => LeafKind::any(None),
            Some(_) => LeafKind::Primitive(schema_type),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LeafKind::Literal(_) => "literal",
            LeafKind::Object(_) => "object",
            LeafKind::Array(_) => "array",
            LeafKind::Null => "null",
            LeafKind::Any { .. } => "any",
            LeafKind::Primitive(_) => "primitive",
        }
    }

    /// Feeds one document event.
    pub fn feed(&mut self, schema: &Schema, lex: &LexEvent) -> SchemaResult<Step> {
        match self {
            LeafKind::Literal(id) => {
                let node = schema.node(*id);
                scalar(lex, node.json_type(), |value| validate_literal_value(node, value))
            }
            LeafKind::Null => scalar(lex, JsonType::Null, |value| {
                match JsonType::of_literal(value) {
                    JsonType::Null => Ok(()),
                    actual => Err(invalid_type(JsonType::Null, actual)),
                }
            }),
            LeafKind::Primitive(schema_type) => {
                let schema_type = *schema_type;
                let expected = schema_type.json_type().unwrap_or(JsonType::Mixed);
                scalar(lex, expected, |value| check_primitive(schema_type, value))
            }
            LeafKind::Any { depth, expected } => feed_any(depth, *expected, lex),
            LeafKind::Object(leaf) => leaf.feed(schema, lex),
            LeafKind::Array(leaf) => leaf.feed(schema, lex),
        }
    }
}

/// Follows a scalar value; containers are a type mismatch.
fn scalar(
    lex: &LexEvent,
    expected: JsonType,
    check: impl FnOnce(&[u8]) -> SchemaResult<()>,
) -> SchemaResult<Step> {
    match lex.kind() {
        LexEventType::LiteralEnd => {
            check(lex.value())?;
            Ok(Step::Done)
        }
        LexEventType::ObjectBegin | LexEventType::ArrayBegin => {
            Err(invalid_type(expected, json_type_of(lex)))
        }
        _ => Ok(Step::Continue),
    }
}

fn check_primitive(schema_type: SchemaType, value: &[u8]) -> SchemaResult<()> {
    let actual = JsonType::of_literal(value);
    if let Some(expected) = schema_type.json_type() {
        if !expected.accepts(actual) {
            return Err(invalid_type(expected, actual));
        }
    }
    if let Some(format) = schema_type.format() {
        Constraint::Format(format).validate(value)?;
    }
    Ok(())
}

fn feed_any(depth: &mut usize, expected: Option<JsonType>, lex: &LexEvent) -> SchemaResult<Step> {
    match lex.kind() {
        LexEventType::ObjectBegin | LexEventType::ArrayBegin => {
            if *depth == 0 {
                if let Some(expected) = expected {
                    let actual = json_type_of(lex);
                    if actual != expected {
                        return Err(invalid_type(expected, actual));
                    }
                }
            }
            *depth += 1;
            Ok(Step::Continue)
        }
        LexEventType::ObjectEnd | LexEventType::ArrayEnd => {
            *depth = depth.saturating_sub(1);
            Ok(if *depth == 0 { Step::Done } else { Step::Continue })
        }
        LexEventType::LiteralEnd if *depth == 0 => match expected {
            Some(expected) => Err(invalid_type(expected, json_type_of(lex))),
            None => Ok(Step::Done),
        },
        _ => Ok(Step::Continue),
    }
}

// ==================
// Objects
// ==================

pub(crate) struct ObjectLeaf {
    node: NodeId,
    /// Required keys not seen yet, in declaration order
    required: Vec<String>,
    seen: HashSet<String>,
    key: Option<(String, LexEvent)>,
    started: bool,
}

impl ObjectLeaf {
    fn new(schema: &Schema, node: NodeId) -> Self {
        let required = match schema.node(node).constraint(ConstraintType::RequiredKeys) {
            Some(Constraint::RequiredKeys(keys)) => keys.clone(),
            _ => Vec::new(),
        };
        Self {
            node,
            required,
            seen: HashSet::new(),
            key: None,
            started: false,
        }
    }

    fn feed(&mut self, schema: &Schema, lex: &LexEvent) -> SchemaResult<Step> {
        if !self.started {
            return match lex.kind() {
                LexEventType::ObjectBegin => {
                    self.started = true;
                    Ok(Step::Continue)
                }
                LexEventType::LiteralBegin => Ok(Step::Continue),
                _ => Err(invalid_type(JsonType::Object, json_type_of(lex))),
            };
        }

        match lex.kind() {
            LexEventType::ObjectKeyEnd => {
                let name = unquote(lex.value())?;
                if !self.seen.insert(name.clone()) {
                    return Err(SchemaError::at_lex(
                        ErrorKind::DuplicateKeysInDocument(name),
                        lex,
                    ));
                }
                self.key = Some((name, lex.clone()));
                Ok(Step::Continue)
            }
            LexEventType::ObjectValueBegin => self.value_leaves(schema),
            LexEventType::ObjectEnd => match self.required.first() {
                Some(missing) => Err(SchemaError::at_lex(
                    ErrorKind::RequiredKeyNotFound(missing.clone()),
                    lex,
                )),
                None => Ok(Step::Done),
            },
            _ => Ok(Step::Continue),
        }
    }

    /// Picks the schema for the value of the current key.
    fn value_leaves(&mut self, schema: &Schema) -> SchemaResult<Step> {
        let (name, key_lex) = match self.key.take() {
            Some(key) => key,
            None => return Err(ErrorKind::Loader("value without key".to_string()).into()),
        };
        let node = schema.node(self.node);
        let object = match node.object() {
            Some(object) => object,
            None => return Err(invalid_type(node.json_type(), JsonType::Object)),
        };

        if let Some(key) = object.plain_key(&name) {
            self.required.retain(|k| k != &name);
            return Ok(Step::Spawn(leaves_for(schema, key.child)?));
        }

        for key in object.shortcut_keys() {
            let matches = schema
                .type_root(&key.name)
                .map_or(false, |root| validate_literal_value2(schema, root, key_lex.value()).is_ok());
            if matches {
                self.required.retain(|k| k != &key.name);
                return Ok(Step::Spawn(leaves_for(schema, key.child)?));
            }
        }

        match node.constraint(ConstraintType::AdditionalProperties) {
            Some(Constraint::AdditionalProperties(AdditionalProperties::Allowed(true))) => {
                Ok(Step::Spawn(vec![LeafKind::any(None)]))
            }
            Some(Constraint::AdditionalProperties(AdditionalProperties::Primitive(t))) => {
                Ok(Step::Spawn(vec![LeafKind::primitive(*t)]))
            }
            Some(Constraint::AdditionalProperties(AdditionalProperties::UserType(r))) => {
                Ok(Step::Spawn(leaves_for(schema, schema.resolve_type(r)?)?))
            }
            _ => Err(SchemaError::at_lex(
                ErrorKind::SchemaDoesNotSupportKey(name),
                &key_lex,
            )),
        }
    }
}

// ==================
// Arrays
// ==================

pub(crate) struct ArrayLeaf {
    node: NodeId,
    count: usize,
    started: bool,
}

impl ArrayLeaf {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            count: 0,
            started: false,
        }
    }

    fn feed(&mut self, schema: &Schema, lex: &LexEvent) -> SchemaResult<Step> {
        if !self.started {
            return match lex.kind() {
                LexEventType::ArrayBegin => {
                    self.started = true;
                    Ok(Step::Continue)
                }
                LexEventType::LiteralBegin => Ok(Step::Continue),
                _ => Err(invalid_type(JsonType::Array, json_type_of(lex))),
            };
        }

        let node = schema.node(self.node);
        let items = node.array().map(|a| a.items()).unwrap_or(&[]);
        match lex.kind() {
            LexEventType::ArrayItemBegin => {
                let leaves = match items.len() {
                    0 => vec![LeafKind::any(None)],
                    1 => leaves_for(schema, items[0])?,
                    n if self.count < n => leaves_for(schema, items[self.count])?,
                    _ => return Err(SchemaError::at_lex(ErrorKind::UnexpectedArrayItem, lex)),
                };
                self.count += 1;
                Ok(Step::Spawn(leaves))
            }
            LexEventType::ArrayEnd => {
                if items.len() > 1 {
                    for (index, item) in items.iter().enumerate().skip(self.count) {
                        if schema.node(*item).optional() != Some(true) {
                            return Err(SchemaError::at_lex(
                                ErrorKind::RequiredArrayItemNotFound(index),
                                lex,
                            ));
                        }
                    }
                }
                self.check_item_count(node.constraint(ConstraintType::MinItems), node.constraint(ConstraintType::MaxItems))
                    .map_err(|e| e.or_at(lex))?;
                Ok(Step::Done)
            }
            _ => Ok(Step::Continue),
        }
    }

    fn check_item_count(&self, min: Option<&Constraint>, max: Option<&Constraint>) -> SchemaResult<()> {
        if let Some(Constraint::MinItems(min)) = min {
            if self.count < *min {
                return Err(ErrorKind::ConstraintValidation(
                    "minItems".to_string(),
                    format!("{} items, at least {} expected", self.count, min),
                )
                .into());
            }
        }
        if let Some(Constraint::MaxItems(max)) = max {
            if self.count > *max {
                return Err(ErrorKind::ConstraintValidation(
                    "maxItems".to_string(),
                    format!("{} items, at most {} expected", self.count, max),
                )
                .into());
            }
        }
        Ok(())
    }
}
