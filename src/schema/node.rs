//! Schema nodes
//!
//! Nodes live in an arena owned by [`Schema`](super::Schema) and refer to
//! each other by [`NodeId`]. A node is anchored to the lexical event of its
//! example value and carries the constraints attached to it.

use std::fmt;

use crate::collections::OrderedMap;
use crate::constraint::{
    Constraint, ConstraintMap, ConstraintType, Source, TypeConstraint, TypesList,
};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::JsonType;
use crate::lexeme::{LexEvent, LexEventType};

/// Index of a node in the schema arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One key of an object node.
#[derive(Debug, Clone)]
pub struct ObjectKey {
    /// Key text; `@name` for shortcut keys
    pub name: String,
    pub child: NodeId,
    /// Written as `@name`: the key text is defined by a type
    pub is_shortcut: bool,
    pub lex: LexEvent,
}

/// Keys of an object node in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    keys: OrderedMap<String, ObjectKey>,
}

impl ObjectNode {
    /// Adds a key, rejecting duplicates.
    pub fn add_key(&mut self, key: ObjectKey) -> SchemaResult<()> {
        let lex = key.lex.clone();
        self.keys.insert(key.name.clone(), key).map_err(|rejected| {
            SchemaError::at_lex(ErrorKind::DuplicateKeysInSchema(rejected.name), &lex)
        })
    }

    pub fn get(&self, name: &str) -> Option<&ObjectKey> {
        self.keys.get(&name.to_string())
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.keys.contains_key(&name.to_string())
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.keys.values()
    }

    /// Child nodes in declaration order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.keys.values().map(|k| k.child)
    }

    /// Returns the first ordinary key with this exact name.
    pub fn plain_key(&self, name: &str) -> Option<&ObjectKey> {
        self.get(name).filter(|k| !k.is_shortcut)
    }

    pub fn shortcut_keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.keys.values().filter(|k| k.is_shortcut)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Items of an array node.
///
/// No items accepts any items, one item is a template for every item and
/// several items describe a tuple.
#[derive(Debug, Clone, Default)]
pub struct ArrayNode {
    items: Vec<NodeId>,
}

impl ArrayNode {
    pub fn push(&mut self, item: NodeId) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Variant of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Literal,
    Object(ObjectNode),
    Array(ArrayNode),
    /// Literal position turned into a set of alternatives by `or`
    Mixed,
    /// Value written as a types shortcut
    MixedValue,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal => "literal",
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::Mixed => "mixed",
            NodeKind::MixedValue => "mixed-value",
        }
    }
}

/// One position of the schema tree.
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
    json_type: JsonType,
    /// Type name as the author sees it: built-in name or `@name`
    schema_type: String,
    lex: LexEvent,
    /// False for nodes generated from rules, which have no example value
    has_example: bool,
    constraints: ConstraintMap,
    comment: Option<String>,
}

impl Node {
    /// Creates the node opened by a value-begin event.
    pub fn open(lex: LexEvent, parent: Option<NodeId>) -> SchemaResult<Node> {
        let (kind, json_type) = match lex.kind() {
            LexEventType::LiteralBegin => (NodeKind::Literal, JsonType::String),
            LexEventType::ObjectBegin => (NodeKind::Object(ObjectNode::default()), JsonType::Object),
            LexEventType::ArrayBegin => (NodeKind::Array(ArrayNode::default()), JsonType::Array),
            LexEventType::MixedValueBegin => (NodeKind::MixedValue, JsonType::Mixed),
            other => {
                return Err(SchemaError::at_lex(
                    ErrorKind::Loader(other.to_string()),
                    &lex,
                ))
            }
        };
        Ok(Node {
            parent,
            kind,
            json_type,
            schema_type: json_type.as_str().to_string(),
            lex,
            has_example: true,
            constraints: ConstraintMap::new(),
            comment: None,
        })
    }

    /// Creates a node without an example value, anchored at `lex`.
    pub fn generated(kind: NodeKind, json_type: JsonType, lex: LexEvent) -> Node {
        Node {
            parent: None,
            kind,
            json_type,
            schema_type: json_type.as_str().to_string(),
            lex,
            has_example: false,
            constraints: ConstraintMap::new(),
            comment: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn json_type(&self) -> JsonType {
        self.json_type
    }

    pub fn schema_type(&self) -> &str {
        &self.schema_type
    }

    /// The anchoring event; after loading it covers the whole example.
    pub fn lex(&self) -> &LexEvent {
        &self.lex
    }

    /// Example value text.
    pub fn value(&self) -> &[u8] {
        self.lex.value()
    }

    pub fn has_example(&self) -> bool {
        self.has_example
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn constraints(&self) -> &ConstraintMap {
        &self.constraints
    }

    pub fn constraint(&self, t: ConstraintType) -> Option<&Constraint> {
        self.constraints.get(&t)
    }

    pub fn has(&self, t: ConstraintType) -> bool {
        self.constraints.contains_key(&t)
    }

    pub fn object(&self) -> Option<&ObjectNode> {
        match &self.kind {
            NodeKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&ArrayNode> {
        match &self.kind {
            NodeKind::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Children in declaration order.
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Object(object) => object.children().collect(),
            NodeKind::Array(array) => array.items().to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self.kind, NodeKind::Mixed | NodeKind::MixedValue)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.constraint(ConstraintType::Nullable), Some(Constraint::Nullable(true)))
    }

    /// Returns the `optional` rule if one was written.
    pub fn optional(&self) -> Option<bool> {
        match self.constraint(ConstraintType::Optional) {
            Some(Constraint::Optional(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn types_list(&self) -> Option<&TypesList> {
        match self.constraint(ConstraintType::TypesList) {
            Some(Constraint::TypesList(list)) => Some(list),
            _ => None,
        }
    }

    pub fn type_constraint(&self) -> Option<&TypeConstraint> {
        match self.constraint(ConstraintType::Type) {
            Some(Constraint::Type(t)) => Some(t),
            _ => None,
        }
    }

    /// True when the `type` rule names a user type.
    pub fn is_type_reference(&self) -> bool {
        self.type_constraint().map_or(false, TypeConstraint::is_reference)
    }

    // ==================
    // Mutation (loader and compile passes)
    // ==================

    pub(crate) fn set_json_type(&mut self, json_type: JsonType) {
        self.json_type = json_type;
    }

    pub(crate) fn set_schema_type(&mut self, schema_type: impl Into<String>) {
        self.schema_type = schema_type.into();
    }

    pub(crate) fn set_lex(&mut self, lex: LexEvent) {
        self.lex = lex;
    }

    pub(crate) fn set_comment(&mut self, comment: String) {
        self.comment = Some(comment);
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Turns a literal position into a set of alternatives.
    pub(crate) fn make_mixed(&mut self) {
        if matches!(self.kind, NodeKind::Literal) {
            self.kind = NodeKind::Mixed;
            self.json_type = JsonType::Mixed;
            self.schema_type = JsonType::Mixed.as_str().to_string();
        }
    }

    pub(crate) fn constraint_mut(&mut self, t: ConstraintType) -> Option<&mut Constraint> {
        self.constraints.get_mut(&t)
    }

    /// Attaches a constraint, rejecting a second one of the same type.
    ///
    /// A shortcut value gives way instead: a second `type` turns it into a
    /// `mixed` value and a second types list extends the first.
    pub(crate) fn add_constraint(&mut self, constraint: Constraint, lex: &LexEvent) -> SchemaResult<()> {
        let t = constraint.constraint_type();
        if !self.constraints.contains_key(&t) {
            self.constraints.set(t, constraint);
            return Ok(());
        }

        if matches!(self.kind, NodeKind::MixedValue) {
            match constraint {
                Constraint::Type(_) => {
                    self.schema_type = JsonType::Mixed.as_str().to_string();
                    self.constraints.set(
                        t,
                        Constraint::Type(TypeConstraint {
                            name: JsonType::Mixed.as_str().to_string(),
                            lex: lex.clone(),
                            source: Source::Generated,
                        }),
                    );
                    if !self.constraints.contains_key(&ConstraintType::Or) {
                        self.constraints
                            .set(ConstraintType::Or, Constraint::Or(Source::Generated));
                    }
                    return Ok(());
                }
                Constraint::TypesList(extra) => {
                    if let Some(Constraint::TypesList(list)) = self.constraints.get_mut(&t) {
                        for name in extra.names {
                            if !list.contains(&name.name) {
                                list.names.push(name);
                            }
                        }
                    }
                    return Ok(());
                }
                Constraint::Or(_) => return Ok(()),
                _ => {}
            }
        }

        Err(SchemaError::at_lex(
            ErrorKind::DuplicateRule(t.name().to_string()),
            lex,
        ))
    }

    /// Attaches or replaces a constraint.
    pub(crate) fn set_constraint(&mut self, constraint: Constraint) {
        self.constraints.set(constraint.constraint_type(), constraint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::TypeRef;
    use crate::source::SourceFile;

    fn lex(kind: LexEventType) -> LexEvent {
        LexEvent::new(kind, 0, 0, SourceFile::anonymous("@cat"))
    }

    fn type_rule(name: &str) -> Constraint {
        Constraint::Type(TypeConstraint {
            name: name.to_string(),
            lex: lex(LexEventType::LiteralEnd),
            source: Source::Manual,
        })
    }

    #[test]
    fn test_open_by_event_kind() {
        let node = Node::open(lex(LexEventType::ObjectBegin), None).unwrap();
        assert!(node.object().is_some());
        assert_eq!(node.json_type(), JsonType::Object);

        let node = Node::open(lex(LexEventType::MixedValueBegin), None).unwrap();
        assert!(node.is_mixed());
        assert!(Node::open(lex(LexEventType::ObjectKeyBegin), None).is_err());
    }

    #[test]
    fn test_duplicate_rule_is_rejected() {
        let mut node = Node::open(lex(LexEventType::LiteralBegin), None).unwrap();
        let at = lex(LexEventType::ObjectKeyEnd);
        node.add_constraint(Constraint::MinLength(1), &at).unwrap();
        let err = node.add_constraint(Constraint::MinLength(2), &at).unwrap_err();
        assert_eq!(err.code(), 1206);
    }

    #[test]
    fn test_shortcut_value_type_conflict_becomes_mixed() {
        let mut node = Node::open(lex(LexEventType::MixedValueBegin), None).unwrap();
        let at = lex(LexEventType::TypesShortcutEnd);
        node.add_constraint(type_rule("@cat"), &at).unwrap();
        node.add_constraint(type_rule("@dog"), &at).unwrap();
        assert_eq!(node.schema_type(), "mixed");

        let list = |name: &str| {
            Constraint::TypesList(TypesList {
                names: vec![TypeRef::new(name, at.clone())],
                source: Source::Generated,
            })
        };
        node.add_constraint(list("@cat"), &at).unwrap();
        node.add_constraint(list("@dog"), &at).unwrap();
        assert_eq!(node.types_list().unwrap().names.len(), 2);
    }

    #[test]
    fn test_object_keys_keep_order_and_reject_duplicates() {
        let mut object = ObjectNode::default();
        let key = |name: &str, child: usize| ObjectKey {
            name: name.to_string(),
            child: NodeId(child),
            is_shortcut: false,
            lex: lex(LexEventType::ObjectKeyEnd),
        };
        object.add_key(key("b", 1)).unwrap();
        object.add_key(key("a", 2)).unwrap();
        assert_eq!(object.add_key(key("b", 3)).unwrap_err().code(), 1205);

        let children: Vec<_> = object.children().collect();
        assert_eq!(children, vec![NodeId(1), NodeId(2)]);
    }
}
