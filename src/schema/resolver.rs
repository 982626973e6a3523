//! Type resolution
//!
//! A node with a types list stands for the roots of the types it names.
//! Flattening follows those names transitively until it reaches nodes that
//! describe a value by themselves.

use std::collections::BTreeSet;

use crate::constraint::{ConstraintType, TypeRef};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::JsonType;

use super::{NodeId, NodeKind, Schema};

/// One concrete alternative a value is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The node's own shape and rules
    Node(NodeId),
    /// Only `null`
    Null,
    /// Any value
    Any,
}

impl Schema {
    /// Looks up the root node of a referenced type.
    pub fn resolve_type(&self, r: &TypeRef) -> SchemaResult<NodeId> {
        self.type_root(&r.name).ok_or_else(|| {
            SchemaError::at_lex(ErrorKind::TypeNotFound(r.name.clone()), &r.lex)
        })
    }

    /// Flattens a node into the alternatives a value may match.
    pub fn targets(&self, id: NodeId) -> SchemaResult<Vec<Target>> {
        let mut out = Vec::new();
        let mut chain = Vec::new();
        self.collect_targets(id, &mut chain, &mut out)?;
        Ok(out)
    }

    fn collect_targets(
        &self,
        id: NodeId,
        chain: &mut Vec<String>,
        out: &mut Vec<Target>,
    ) -> SchemaResult<()> {
        let node = self.node(id);

        if let Some(list) = node.types_list() {
            for r in &list.names {
                if chain.contains(&r.name) {
                    return Err(recursion(r));
                }
                let root = self.resolve_type(r)?;
                chain.push(r.name.clone());
                self.collect_targets(root, chain, out)?;
                chain.pop();
            }
            if node.is_nullable() {
                push_unique(out, Target::Null);
            }
            return Ok(());
        }

        if node.has(ConstraintType::Any) {
            push_unique(out, Target::Any);
            return Ok(());
        }

        push_unique(out, Target::Node(id));
        if node.is_nullable() && !matches!(node.kind(), NodeKind::Literal) {
            push_unique(out, Target::Null);
        }
        Ok(())
    }

    /// Returns the JSON types a node may take, following type references.
    ///
    /// The result contains `Mixed` when any type is possible. A mixed value
    /// (`@a | @b` written as a value) counts as every type; the names it
    /// lists are still followed so that cycles are reported.
    pub fn json_types(&self, id: NodeId) -> SchemaResult<BTreeSet<JsonType>> {
        let mut out = BTreeSet::new();
        let mut chain = Vec::new();
        self.collect_json_types(id, &mut chain, &mut out, true)?;
        Ok(out)
    }

    fn collect_json_types(
        &self,
        id: NodeId,
        chain: &mut Vec<String>,
        out: &mut BTreeSet<JsonType>,
        collect: bool,
    ) -> SchemaResult<()> {
        let node = self.node(id);
        let mixed_value = matches!(node.kind(), NodeKind::MixedValue);
        if collect && mixed_value {
            out.insert(JsonType::Mixed);
        }
        let collect = collect && !mixed_value;

        if let Some(list) = node.types_list() {
            for r in &list.names {
                if chain.contains(&r.name) {
                    return Err(recursion(r));
                }
                let root = self.resolve_type(r)?;
                chain.push(r.name.clone());
                self.collect_json_types(root, chain, out, collect)?;
                chain.pop();
            }
        } else if !collect {
            return Ok(());
        } else if node.has(ConstraintType::Any) {
            out.insert(JsonType::Mixed);
        } else {
            out.insert(node.json_type());
        }

        if collect && node.is_nullable() {
            out.insert(JsonType::Null);
        }
        Ok(())
    }
}

fn recursion(r: &TypeRef) -> SchemaError {
    SchemaError::at_lex(
        ErrorKind::ImpossibleToDetermineTheJsonTypeDueToRecursion(r.name.clone()),
        &r.lex,
    )
}

fn push_unique(out: &mut Vec<Target>, target: Target) {
    if !out.contains(&target) {
        out.push(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::observability::NopLogger;
    use crate::source::SourceFile;

    fn schema_with(types: &[(&str, &str)], root: &str) -> Schema {
        let mut schema = Schema::new();
        for (name, text) in types {
            schema.add_type(name, SourceFile::anonymous(*text)).unwrap();
        }
        schema.load_root(SourceFile::anonymous(root)).unwrap();
        schema.compile(&CompileOptions::default()).unwrap();
        schema
    }

    #[test]
    fn test_mixed_value_takes_every_type() {
        let schema = schema_with(&[("@a", "1"), ("@b", "\"x\"")], "@a | @b");
        let types = schema.json_types(schema.root().unwrap()).unwrap();
        assert_eq!(types.into_iter().collect::<Vec<_>>(), vec![JsonType::Mixed]);

        let schema = schema_with(&[("@a", "1")], "{} // {type: \"@a\"}");
        let types = schema.json_types(schema.root().unwrap()).unwrap();
        assert_eq!(types.into_iter().collect::<Vec<_>>(), vec![JsonType::Integer]);
    }

    #[test]
    fn test_mixed_value_behind_reference() {
        let schema = schema_with(
            &[("@id", "@a | @b"), ("@a", "1"), ("@b", "2")],
            "{\n  @id: 1\n}",
        );
        let root = schema.type_root("@id").unwrap();
        assert!(schema.json_types(root).unwrap().contains(&JsonType::Mixed));
        assert!(schema.check(&NopLogger).is_ok());
    }

    #[test]
    fn test_mixed_value_cycle_is_reported() {
        let schema = schema_with(&[("@a", "@b"), ("@b", "@a")], "@a");
        let err = schema.json_types(schema.root().unwrap()).unwrap_err();
        assert_eq!(err.code(), 1410);
    }

    #[test]
    fn test_targets_follow_references() {
        let schema = schema_with(&[("@a", "1 // {nullable: true}"), ("@b", "\"x\"")], "@a | @b");
        let targets = schema.targets(schema.root().unwrap()).unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| matches!(t, Target::Node(_))));
    }
}
