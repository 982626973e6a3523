//! Document validation
//!
//! A document is scanned once. Its values are followed by a tree of leaves:
//! when a value may match several schema alternatives, one leaf per
//! alternative follows it in parallel. A leaf that finishes its value
//! discards its siblings and hands control back to its parent; a parent
//! whose alternatives all failed fails in turn.

mod leaf;
mod literal;

pub use literal::{validate_literal_value, validate_literal_value2};
pub(crate) use literal::{check_example, json_type_of};

use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::lexeme::{LexEvent, LexEventType};
use crate::observability::Logger;
use crate::scanner::Scanner;
use crate::schema::{NodeId, Schema};
use crate::source::SourceFile;

use leaf::{leaves_for, LeafKind, Step};

/// Validates a whole document against a schema node.
pub(crate) fn validate_document(
    schema: &Schema,
    root: NodeId,
    document: SourceFile,
    logger: &dyn Logger,
) -> SchemaResult<()> {
    let name = document.name().to_string();
    logger.info("VALIDATE_START", &[("document", &name)]);

    let result = run(schema, root, document, logger);
    match &result {
        Ok(()) => logger.info("VALIDATE_OK", &[("document", &name)]),
        Err(err) => logger.error(
            "VALIDATE_FAILED",
            &[
                ("document", &name),
                ("code", &err.code().to_string()),
                ("message", &err.message()),
            ],
        ),
    }
    result
}

fn run(schema: &Schema, root: NodeId, document: SourceFile, logger: &dyn Logger) -> SchemaResult<()> {
    let mut tree = Tree::new(schema, root, logger)?;
    let mut scanner = Scanner::for_document(document);
    while let Some(lex) = scanner.next()? {
        if lex.kind() == LexEventType::NewLine {
            continue;
        }
        tree.feed(&lex)?;
    }
    if tree.complete {
        Ok(())
    } else {
        Err(ErrorKind::UnexpectedEof.into())
    }
}

struct Leaf {
    parent: Option<usize>,
    kind: LeafKind,
    /// Live children; the leaf only receives events when it has none
    children: usize,
    /// Alternatives spawned for the current nested value
    spawned: usize,
    spawn_lex: Option<LexEvent>,
}

/// Leaves following one document, stored in reusable slots.
struct Tree<'s> {
    schema: &'s Schema,
    logger: &'s dyn Logger,
    slots: Vec<Option<Leaf>>,
    free: Vec<usize>,
    /// Slots emptied during the current event; reusable from the next one
    released: Vec<usize>,
    roots: usize,
    live_roots: usize,
    first_lex: Option<LexEvent>,
    complete: bool,
}

impl<'s> Tree<'s> {
    fn new(schema: &'s Schema, root: NodeId, logger: &'s dyn Logger) -> SchemaResult<Self> {
        let kinds = leaves_for(schema, root)?;
        let mut tree = Self {
            schema,
            logger,
            slots: Vec::new(),
            free: Vec::new(),
            released: Vec::new(),
            roots: kinds.len(),
            live_roots: kinds.len(),
            first_lex: None,
            complete: false,
        };
        for kind in kinds {
            tree.insert(None, kind);
        }
        Ok(tree)
    }

    fn insert(&mut self, parent: Option<usize>, kind: LeafKind) -> usize {
        let leaf = Leaf {
            parent,
            kind,
            children: 0,
            spawned: 0,
            spawn_lex: None,
        };
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(leaf);
                slot
            }
            None => {
                self.slots.push(Some(leaf));
                self.slots.len() - 1
            }
        }
    }

    fn remove(&mut self, slot: usize) -> Option<Leaf> {
        let leaf = self.slots[slot].take();
        if leaf.is_some() {
            self.released.push(slot);
        }
        leaf
    }

    fn leaf_mut(&mut self, slot: usize) -> Option<&mut Leaf> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Feeds one event to every leaf waiting for events.
    fn feed(&mut self, lex: &LexEvent) -> SchemaResult<()> {
        if self.complete {
            return Ok(());
        }
        if self.first_lex.is_none() {
            self.first_lex = Some(lex.clone());
        }

        let active: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, leaf)| match leaf {
                Some(leaf) if leaf.children == 0 => Some(slot),
                _ => None,
            })
            .collect();

        for slot in active {
            let schema = self.schema;
            let step = match self.leaf_mut(slot) {
                Some(leaf) if leaf.children == 0 => leaf.kind.feed(schema, lex),
                _ => continue,
            };
            match step {
                Ok(Step::Continue) => {}
                Ok(Step::Spawn(kinds)) if kinds.is_empty() => {
                    self.fail(slot, SchemaError::at_lex(ErrorKind::OrRuleSetValidation, lex))?;
                }
                Ok(Step::Spawn(kinds)) => self.spawn(slot, kinds, lex),
                Ok(Step::Done) => self.finish(slot),
                Err(err) => self.fail(slot, err.or_at(lex))?,
            }
            if self.complete {
                break;
            }
        }
        self.free.append(&mut self.released);
        Ok(())
    }

    fn spawn(&mut self, slot: usize, kinds: Vec<LeafKind>, lex: &LexEvent) {
        let count = kinds.len();
        if let Some(leaf) = self.leaf_mut(slot) {
            leaf.children = count;
            leaf.spawned = count;
            leaf.spawn_lex = Some(lex.clone());
        }
        for kind in kinds {
            self.insert(Some(slot), kind);
        }
    }

    /// A leaf matched its value: its siblings are no longer needed.
    fn finish(&mut self, slot: usize) {
        let parent = self.remove(slot).and_then(|leaf| leaf.parent);
        match parent {
            None => {
                self.complete = true;
                for slot in 0..self.slots.len() {
                    self.remove(slot);
                }
            }
            Some(parent) => {
                self.remove_descendants(parent);
                if let Some(leaf) = self.leaf_mut(parent) {
                    leaf.children = 0;
                    leaf.spawned = 0;
                }
            }
        }
    }

    fn remove_descendants(&mut self, ancestor: usize) {
        let doomed: Vec<usize> = (0..self.slots.len())
            .filter(|slot| self.descends_from(*slot, ancestor))
            .collect();
        for slot in doomed {
            self.remove(slot);
        }
    }

    fn descends_from(&self, slot: usize, ancestor: usize) -> bool {
        let mut current = self.slots[slot].as_ref().and_then(|leaf| leaf.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.slots[parent].as_ref().and_then(|leaf| leaf.parent);
        }
        false
    }

    /// A leaf rejected its value; the error surfaces once no alternative
    /// is left.
    fn fail(&mut self, slot: usize, err: SchemaError) -> SchemaResult<()> {
        let leaf = match self.remove(slot) {
            Some(leaf) => leaf,
            None => return Ok(()),
        };
        self.logger.default(
            "ALTERNATIVE_REJECTED",
            &[("leaf", leaf.kind.name()), ("code", &err.code().to_string())],
        );

        match leaf.parent {
            None => {
                self.live_roots -= 1;
                if self.live_roots > 0 {
                    return Ok(());
                }
                if self.roots > 1 {
                    let or_err = SchemaError::new(ErrorKind::OrRuleSetValidation);
                    return Err(match &self.first_lex {
                        Some(lex) => or_err.or_at(lex),
                        None => or_err,
                    });
                }
                Err(err)
            }
            Some(parent) => {
                let (remaining, spawned, spawn_lex) = match self.leaf_mut(parent) {
                    Some(p) => {
                        p.children -= 1;
                        (p.children, p.spawned, p.spawn_lex.clone())
                    }
                    None => return Ok(()),
                };
                if remaining > 0 {
                    return Ok(());
                }
                let err = match (spawned > 1, spawn_lex) {
                    (true, Some(lex)) => SchemaError::at_lex(ErrorKind::OrRuleSetValidation, &lex),
                    _ => err,
                };
                self.fail(parent, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::observability::{MemoryLogger, NopLogger};

    fn compiled(text: &str) -> Schema {
        let mut schema = Schema::load(SourceFile::new("schema", text)).unwrap();
        schema.compile(&CompileOptions::default()).unwrap();
        schema
    }

    fn validate(schema: &Schema, document: &str) -> SchemaResult<()> {
        schema.validate(SourceFile::new("document", document), &NopLogger)
    }

    #[test]
    fn test_scalar_root() {
        let schema = compiled("5 // {min: 1}");
        assert!(validate(&schema, "7").is_ok());
        assert_eq!(validate(&schema, "0").unwrap_err().code(), 1502);
        assert_eq!(validate(&schema, "{}").unwrap_err().code(), 1501);
    }

    #[test]
    fn test_object_keys() {
        let schema = compiled("{\n  \"id\": 1,\n  \"name\": \"x\" // {optional: true}\n}");
        assert!(validate(&schema, "{\"id\": 2}").is_ok());
        assert!(validate(&schema, "{\"name\": \"y\", \"id\": 2}").is_ok());
        assert_eq!(validate(&schema, "{\"name\": \"y\"}").unwrap_err().code(), 1504);
        assert_eq!(validate(&schema, "{\"id\": 1, \"age\": 3}").unwrap_err().code(), 1503);
        assert_eq!(validate(&schema, "{\"id\": 1, \"id\": 3}").unwrap_err().code(), 1505);
    }

    #[test]
    fn test_error_position_is_the_offending_value() {
        let schema = compiled("{\n  \"id\": 1\n}");
        let err = validate(&schema, "{\n  \"id\": \"x\"\n}").unwrap_err();
        assert_eq!(err.code(), 1501);
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.index(), Some(10));
    }

    #[test]
    fn test_additional_properties() {
        let schema = compiled("{ // {additionalProperties: \"string\"}\n  \"id\": 1\n}");
        assert!(validate(&schema, "{\"id\": 1, \"note\": \"x\"}").is_ok());
        assert_eq!(validate(&schema, "{\"id\": 1, \"note\": 2}").unwrap_err().code(), 1501);

        let schema = compiled("{} // {additionalProperties: true}");
        assert!(validate(&schema, "{\"a\": [1, {\"b\": null}]}").is_ok());
    }

    #[test]
    fn test_arrays() {
        let template = compiled("[ // {minItems: 1, maxItems: 2}\n  1\n]");
        assert!(validate(&template, "[1, 2]").is_ok());
        assert_eq!(validate(&template, "[]").unwrap_err().code(), 1502);
        assert_eq!(validate(&template, "[1, 2, 3]").unwrap_err().code(), 1502);
        assert_eq!(validate(&template, "[\"a\"]").unwrap_err().code(), 1501);

        let tuple = compiled("[1, \"a\"]");
        assert!(validate(&tuple, "[2, \"b\"]").is_ok());
        assert_eq!(validate(&tuple, "[2]").unwrap_err().code(), 1507);
        assert_eq!(validate(&tuple, "[2, \"b\", 3]").unwrap_err().code(), 1506);

        let any = compiled("[]");
        assert!(validate(&any, "[1, \"a\", {}]").is_ok());
    }

    #[test]
    fn test_or_alternatives() {
        let schema = compiled("{\n  \"v\": 1 // {or: [\"integer\", \"string\"]}\n}");
        assert!(validate(&schema, "{\"v\": 3}").is_ok());
        assert!(validate(&schema, "{\"v\": \"x\"}").is_ok());
        assert_eq!(validate(&schema, "{\"v\": true}").unwrap_err().code(), 1412);
    }

    #[test]
    fn test_nullable_object() {
        let schema = compiled("{\n  \"pet\": {} // {nullable: true}\n}");
        assert!(validate(&schema, "{\"pet\": null}").is_ok());
        assert!(validate(&schema, "{\"pet\": {}}").is_ok());
        assert_eq!(validate(&schema, "{\"pet\": 1}").unwrap_err().code(), 1412);
    }

    #[test]
    fn test_logging() {
        let schema = compiled("1");
        let logger = MemoryLogger::new();
        schema
            .validate(SourceFile::new("doc.json", "\"a\""), &logger)
            .unwrap_err();
        let failed = logger.events("VALIDATE_FAILED");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].field("code"), Some("1501"));
        assert_eq!(failed[0].field("document"), Some("doc.json"));
    }
}
