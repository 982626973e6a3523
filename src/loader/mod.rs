//! Schema loader
//!
//! Drives the scanner over one source and grows nodes in the schema arena
//! from its events. Annotations are handed to the rule loader and their
//! rules attached to the single node opened on the annotation's line. A
//! multi-line annotation on a line without nodes belongs to the next value
//! opened in the same container.
//!
//! The compile passes that run after every source is loaded live in
//! [`compile`].

mod compile;
mod embedded;
mod rule_loader;
mod rules;
mod shortcut;

pub(crate) use compile::{compute_required_keys, merge_all_of};

use crate::constraint::check_user_type_name;
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::{unquote, JsonType};
use crate::lexeme::{LexEvent, LexEventType};
use crate::scanner::Scanner;
use crate::schema::{Node, NodeId, NodeKind, ObjectKey, Schema};
use crate::source::SourceFile;

use rule_loader::{RuleLoader, RuleSet};

/// Loads one source into the schema arena and returns its root node.
pub(crate) fn load(schema: &mut Schema, file: SourceFile) -> SchemaResult<NodeId> {
    let mut scanner = Scanner::new(file);
    let mut loader = NodeLoader::new(schema);
    while let Some(lex) = scanner.next()? {
        loader.feed(lex)?;
    }
    loader.finish()
}

/// Key waiting for its value.
struct PendingKey {
    name: String,
    lex: LexEvent,
    is_shortcut: bool,
}

struct NodeLoader<'a> {
    schema: &'a mut Schema,
    /// Open nodes, innermost last
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    key: Option<PendingKey>,
    /// Nodes opened on the current line
    line_nodes: Vec<NodeId>,
    /// Annotation being read and the node it belongs to, if already known
    annotation: Option<(Option<NodeId>, RuleLoader, LexEvent)>,
    /// Annotation read ahead of its value
    pending: Option<PendingRules>,
    last: Option<LexEvent>,
}

/// Rules waiting for a node. `target` is set once the node is opened; for
/// literals and mixed values the rules apply when the node closes.
struct PendingRules {
    set: RuleSet,
    lex: LexEvent,
    /// Container depth the annotation was written at
    depth: usize,
    target: Option<NodeId>,
}

impl<'a> NodeLoader<'a> {
    fn new(schema: &'a mut Schema) -> Self {
        Self {
            schema,
            stack: Vec::new(),
            root: None,
            key: None,
            line_nodes: Vec::new(),
            annotation: None,
            pending: None,
            last: None,
        }
    }

    fn feed(&mut self, lex: LexEvent) -> SchemaResult<()> {
        self.last = Some(lex.clone());
        if lex.kind() == LexEventType::NewLine {
            self.line_nodes.clear();
            return Ok(());
        }

        if let Some((target, rules, _)) = self.annotation.as_mut() {
            let target = *target;
            if let Some(set) = rules.feed(&lex)? {
                if let Some((_, _, begin)) = self.annotation.take() {
                    match target {
                        Some(target) => self.apply_annotation(target, set)?,
                        None => {
                            self.pending = Some(PendingRules {
                                set,
                                lex: begin,
                                depth: self.stack.len(),
                                target: None,
                            })
                        }
                    }
                }
            }
            return Ok(());
        }

        match lex.kind() {
            LexEventType::InlineAnnotationBegin | LexEventType::MultiLineAnnotationBegin => {
                self.begin_annotation(&lex)
            }
            LexEventType::LiteralBegin
            | LexEventType::ObjectBegin
            | LexEventType::ArrayBegin
            | LexEventType::MixedValueBegin => self.open_node(lex),
            LexEventType::LiteralEnd => self.close_literal(lex),
            LexEventType::ObjectEnd | LexEventType::ArrayEnd | LexEventType::MixedValueEnd => {
                self.close_node(lex)
            }
            LexEventType::ObjectKeyEnd => {
                let name = unquote(lex.value()).map_err(|e| e.or_at(&lex))?;
                self.key = Some(PendingKey {
                    name,
                    lex,
                    is_shortcut: false,
                });
                Ok(())
            }
            LexEventType::KeyShortcutEnd => {
                let name = lex.text();
                check_user_type_name(&name, &lex)?;
                self.key = Some(PendingKey {
                    name,
                    lex,
                    is_shortcut: true,
                });
                Ok(())
            }
            LexEventType::TypesShortcutEnd => {
                let id = self.top(&lex)?;
                shortcut::expand(self.schema.node_mut(id), &lex)
            }
            LexEventType::ObjectKeyBegin
            | LexEventType::KeyShortcutBegin
            | LexEventType::ObjectValueBegin
            | LexEventType::ObjectValueEnd
            | LexEventType::ArrayItemBegin
            | LexEventType::ArrayItemEnd
            | LexEventType::TypesShortcutBegin
            | LexEventType::EndTop => Ok(()),
            _ => Err(unexpected(&lex)),
        }
    }

    fn finish(self) -> SchemaResult<NodeId> {
        if let Some(pending) = &self.pending {
            return Err(without_example(&pending.lex));
        }
        if self.annotation.is_some() || !self.stack.is_empty() {
            let err = SchemaError::new(ErrorKind::UnexpectedEof);
            return Err(match &self.last {
                Some(lex) => err.or_at(lex),
                None => err,
            });
        }
        self.root
            .ok_or_else(|| SchemaError::new(ErrorKind::EmptyInput))
    }

    fn top(&self, lex: &LexEvent) -> SchemaResult<NodeId> {
        self.stack.last().copied().ok_or_else(|| unexpected(lex))
    }

    // ==================
    // Nodes
    // ==================

    fn open_node(&mut self, lex: LexEvent) -> SchemaResult<()> {
        let parent = self.stack.last().copied();
        let id = self.schema.push_node(Node::open(lex.clone(), parent)?);

        match parent {
            None => {
                if self.root.is_some() {
                    return Err(unexpected(&lex));
                }
                self.root = Some(id);
            }
            Some(parent) => match self.schema.node_mut(parent).kind_mut() {
                NodeKind::Object(object) => {
                    let key = self.key.take().ok_or_else(|| unexpected(&lex))?;
                    object.add_key(ObjectKey {
                        name: key.name,
                        child: id,
                        is_shortcut: key.is_shortcut,
                        lex: key.lex,
                    })?;
                }
                NodeKind::Array(array) => array.push(id),
                _ => return Err(unexpected(&lex)),
            },
        }

        let is_container = matches!(
            lex.kind(),
            LexEventType::ObjectBegin | LexEventType::ArrayBegin
        );
        self.stack.push(id);
        self.line_nodes.push(id);

        if let Some(pending) = self.pending.as_mut() {
            if pending.target.is_none() {
                pending.target = Some(id);
                if is_container {
                    self.apply_pending(id)?;
                }
            }
        }
        Ok(())
    }

    fn close_literal(&mut self, lex: LexEvent) -> SchemaResult<()> {
        let id = self.stack.pop().ok_or_else(|| unexpected(&lex))?;
        let node = self.schema.node_mut(id);
        let json_type = JsonType::of_literal(lex.value());
        node.set_json_type(json_type);
        node.set_schema_type(json_type.as_str());
        node.set_lex(lex);
        self.apply_pending(id)
    }

    fn close_node(&mut self, lex: LexEvent) -> SchemaResult<()> {
        if let Some(pending) = &self.pending {
            if pending.target.is_none() && pending.depth == self.stack.len() {
                return Err(without_example(&pending.lex));
            }
        }
        let id = self.stack.pop().ok_or_else(|| unexpected(&lex))?;
        self.schema.node_mut(id).set_lex(lex);
        self.apply_pending(id)
    }

    // ==================
    // Annotations
    // ==================

    fn begin_annotation(&mut self, lex: &LexEvent) -> SchemaResult<()> {
        let ahead = lex.kind() == LexEventType::MultiLineAnnotationBegin;
        let target = match self.line_nodes.as_slice() {
            [] if ahead && self.pending.is_none() => None,
            [] => return Err(without_example(lex)),
            [single] => Some(*single),
            _ => {
                return Err(SchemaError::at_lex(
                    ErrorKind::IncorrectRuleForSeveralNode,
                    lex,
                ))
            }
        };
        self.annotation = Some((target, RuleLoader::new(), lex.clone()));
        Ok(())
    }

    /// Applies rules read ahead once their node `id` is ready for them.
    fn apply_pending(&mut self, id: NodeId) -> SchemaResult<()> {
        match &self.pending {
            Some(pending) if pending.target == Some(id) => {}
            _ => return Ok(()),
        }
        match self.pending.take() {
            Some(pending) => self.apply_annotation(id, pending.set),
            None => Ok(()),
        }
    }

    fn apply_annotation(&mut self, target: NodeId, set: RuleSet) -> SchemaResult<()> {
        if let Some(text) = set.text {
            self.schema.node_mut(target).set_comment(text);
        }
        rules::apply_rules(self.schema, target, &set.entries)
    }
}

fn without_example(lex: &LexEvent) -> SchemaError {
    SchemaError::at_lex(ErrorKind::IncorrectRuleWithoutExample, lex)
}

fn unexpected(lex: &LexEvent) -> SchemaError {
    SchemaError::at_lex(ErrorKind::Loader(lex.kind().to_string()), lex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, ConstraintType};

    fn load_text(text: &str) -> SchemaResult<Schema> {
        Schema::load(SourceFile::anonymous(text))
    }

    fn root(schema: &Schema) -> &Node {
        schema.node(schema.root().unwrap())
    }

    fn child<'s>(schema: &'s Schema, key: &str) -> &'s Node {
        let object = root(schema).object().unwrap();
        schema.node(object.get(key).unwrap().child)
    }

    #[test]
    fn test_literal_types() {
        let schema = load_text("[1, 1.5, \"a\", true, null]").unwrap();
        let items = root(&schema).array().unwrap().items().to_vec();
        let types: Vec<_> = items.iter().map(|id| schema.node(*id).json_type()).collect();
        assert_eq!(
            types,
            vec![
                JsonType::Integer,
                JsonType::Float,
                JsonType::String,
                JsonType::Boolean,
                JsonType::Null
            ]
        );
    }

    #[test]
    fn test_annotation_attaches_to_line_node() {
        let text = "{\n  \"id\": 5, // {min: 1, max: 10} - identifier\n  \"name\": \"x\"\n}";
        let schema = load_text(text).unwrap();
        let id = child(&schema, "id");
        assert!(id.has(ConstraintType::Min));
        assert!(id.has(ConstraintType::Max));
        assert_eq!(id.comment(), Some("identifier"));
        assert!(child(&schema, "name").constraints().is_empty());
    }

    #[test]
    fn test_annotation_without_node() {
        let err = load_text("{\n  // {min: 1}\n  \"id\": 5\n}").unwrap_err();
        assert_eq!(err.code(), 1203);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_multi_line_annotation_before_value() {
        let schema = load_text("/* {min: 1} */ 5").unwrap();
        assert!(root(&schema).has(ConstraintType::Min));

        let schema = load_text("/* {max: 9}\n   large number */\n5").unwrap();
        assert!(root(&schema).has(ConstraintType::Max));
        assert_eq!(root(&schema).comment(), Some("large number"));

        let text = "{\n  /* {optional: true} */\n  \"a\": 1,\n  \"b\": 2\n}";
        let schema = load_text(text).unwrap();
        assert!(child(&schema, "a").has(ConstraintType::Optional));
        assert!(child(&schema, "b").constraints().is_empty());

        let text = "{\n  /* {minItems: 1} */\n  \"tags\": [\n    \"x\"\n  ]\n}";
        let schema = load_text(text).unwrap();
        assert!(child(&schema, "tags").has(ConstraintType::MinItems));
    }

    #[test]
    fn test_multi_line_annotation_before_shortcut() {
        let schema = load_text("/* {nullable: true} */\n@cat").unwrap();
        let node = root(&schema);
        assert!(matches!(node.kind(), NodeKind::MixedValue));
        assert!(node.has(ConstraintType::Nullable));
    }

    #[test]
    fn test_multi_line_annotation_without_value() {
        let err = load_text("{\n  \"a\": 1\n  /* {min: 1} */\n}").unwrap_err();
        assert_eq!(err.code(), 1203);
        assert_eq!(err.line(), Some(3));

        assert_eq!(load_text("5\n/* {min: 1} */").unwrap_err().code(), 1203);
        assert_eq!(
            load_text("/* {min: 1} */\n/* {max: 2} */\n5").unwrap_err().code(),
            1203
        );
    }

    #[test]
    fn test_annotation_for_several_nodes() {
        let err = load_text("{\"id\": 5} // {min: 1}").unwrap_err();
        assert_eq!(err.code(), 1204);
    }

    #[test]
    fn test_duplicate_keys_and_rules() {
        assert_eq!(load_text("{\"a\": 1, \"a\": 2}").unwrap_err().code(), 1205);
        assert_eq!(load_text("1 // {min: 0, min: 1}").unwrap_err().code(), 1206);
        assert_eq!(load_text("1 // {size: 3}").unwrap_err().code(), 1208);
    }

    #[test]
    fn test_rule_value_errors_are_positioned() {
        let err = load_text("1 // {min: \"a\"}").unwrap_err();
        assert_eq!(err.code(), 1202);
        assert_eq!(err.index(), Some(11));

        let err = load_text("1.5 // {precision: 0}").unwrap_err();
        assert_eq!(err.code(), 1302);
    }

    #[test]
    fn test_type_rule() {
        let schema = load_text("\"a@b.c\" // {type: \"email\"}").unwrap();
        let node = root(&schema);
        assert_eq!(node.schema_type(), "email");
        assert!(node.has(ConstraintType::Email));

        let schema = load_text("1 // {type: \"float\"}").unwrap();
        assert_eq!(root(&schema).json_type(), JsonType::Float);

        let schema = load_text("\"x\" // {type: \"any\"}").unwrap();
        assert!(root(&schema).has(ConstraintType::Any));
        assert_eq!(root(&schema).json_type(), JsonType::String);

        let schema = load_text("{} // {type: \"@cat\"}").unwrap();
        assert!(root(&schema).is_type_reference());
        assert_eq!(root(&schema).types_list().unwrap().names[0].name, "@cat");

        assert_eq!(load_text("1 // {type: \"int\"}").unwrap_err().code(), 1210);
    }

    #[test]
    fn test_exclusive_flags_fold_into_bounds() {
        let schema = load_text("5 // {min: 1, exclusiveMinimum: true, max: 9}").unwrap();
        match root(&schema).constraint(ConstraintType::Min) {
            Some(Constraint::Min(bound)) => assert!(bound.exclusive),
            other => panic!("unexpected {:?}", other),
        }
        match root(&schema).constraint(ConstraintType::Max) {
            Some(Constraint::Max(bound)) => assert!(!bound.exclusive),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_or_generates_types() {
        let schema = load_text("1 // {or: [{type: \"integer\", min: 0}, \"string\", \"@cat\"]}").unwrap();
        let node = root(&schema);
        assert!(matches!(node.kind(), NodeKind::Mixed));
        let names: Vec<_> = node
            .types_list()
            .unwrap()
            .names
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["#0", "#1", "@cat"]);

        let first = schema.node(schema.type_root("#0").unwrap());
        assert_eq!(first.json_type(), JsonType::Integer);
        assert!(first.has(ConstraintType::Min));
        assert!(!first.has_example());
        assert!(schema.user_type("#1").unwrap().generated);
    }

    #[test]
    fn test_or_errors() {
        assert_eq!(load_text("1 // {or: []}").unwrap_err().code(), 1211);
        assert_eq!(load_text("1 // {or: [{min: 1}]}").unwrap_err().code(), 1212);
        assert_eq!(load_text("1 // {or: \"@cat\"}").unwrap_err().code(), 1202);
    }

    #[test]
    fn test_enum_rule() {
        let schema = load_text("\"white\" // {enum: [\"white\", \"black\"]}").unwrap();
        assert!(root(&schema).has(ConstraintType::Enum));
        assert_eq!(load_text("1 // {enum: [1, 2, 1]}").unwrap_err().code(), 1213);
        assert_eq!(load_text("1 // {enum: [[1]]}").unwrap_err().code(), 1202);
    }

    #[test]
    fn test_shortcuts() {
        let schema = load_text("{\n  \"pet\": @cat | @dog,\n  @id: \"x\"\n}").unwrap();
        let pet = child(&schema, "pet");
        assert!(matches!(pet.kind(), NodeKind::MixedValue));
        assert!(pet.has(ConstraintType::Or));
        assert_eq!(pet.types_list().unwrap().names.len(), 2);

        let object = root(&schema).object().unwrap();
        let key = object.get("@id").unwrap();
        assert!(key.is_shortcut);
    }

    #[test]
    fn test_shortcut_with_type_rule_becomes_mixed() {
        let schema = load_text("@cat // {type: \"@dog\"}").unwrap();
        let node = root(&schema);
        assert_eq!(node.schema_type(), "mixed");
        assert!(node.has(ConstraintType::Or));
        assert_eq!(node.types_list().unwrap().names.len(), 2);
    }

    #[test]
    fn test_const_stores_example() {
        let schema = load_text("\"cat\" // {const: true}").unwrap();
        match root(&schema).constraint(ConstraintType::Const) {
            Some(Constraint::Const(rule)) => assert_eq!(rule.example(), b"\"cat\""),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(load_text("{} // {const: true}").unwrap_err().code(), 1214);
    }

    #[test]
    fn test_unclosed_input() {
        assert_eq!(load_text("").unwrap_err().code(), 1104);
        assert_eq!(load_text("{\"a\": 1").unwrap_err().code(), 1102);
    }
}
