//! Compile passes
//!
//! Run once loading is complete, before checking:
//!
//! 1. `allOf` merge: keys of the named object types are appended to the
//!    host object, transitively
//! 2. required keys: every object records which of its keys a document
//!    must contain

use std::collections::HashSet;

use crate::config::CompileOptions;
use crate::constraint::{AdditionalProperties, Constraint, ConstraintType, TypeRef};
use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::schema::{Node, NodeId, NodeKind, ObjectKey, Schema};

/// Merges every `allOf` rule into its host object.
pub(crate) fn merge_all_of(schema: &mut Schema) -> SchemaResult<()> {
    let hosts: Vec<NodeId> = (0..schema.node_count())
        .map(NodeId)
        .filter(|id| schema.node(*id).has(ConstraintType::AllOf))
        .collect();

    let mut done = HashSet::new();
    for host in hosts {
        let mut visiting = Vec::new();
        merge_node(schema, host, &mut visiting, &mut done)?;
    }
    Ok(())
}

fn merge_node(
    schema: &mut Schema,
    id: NodeId,
    visiting: &mut Vec<String>,
    done: &mut HashSet<NodeId>,
) -> SchemaResult<()> {
    if done.contains(&id) {
        return Ok(());
    }
    let refs = match schema.node(id).constraint(ConstraintType::AllOf) {
        Some(Constraint::AllOf(refs)) if schema.node(id).object().is_some() => refs.clone(),
        // non-object hosts are reported by the checker
        _ => {
            done.insert(id);
            return Ok(());
        }
    };

    for r in &refs {
        if visiting.contains(&r.name) {
            return Err(SchemaError::at_lex(ErrorKind::AllOfCycle(r.name.clone()), &r.lex));
        }
        let source = schema.resolve_type(r)?;
        if schema.node(source).object().is_none() {
            return Err(SchemaError::at_lex(
                ErrorKind::UnacceptableTypeInAllOfRule(r.name.clone()),
                &r.lex,
            ));
        }

        visiting.push(r.name.clone());
        merge_node(schema, source, visiting, done)?;
        visiting.pop();

        let keys: Vec<ObjectKey> = schema
            .node(source)
            .object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        let additional = match schema.node(source).constraint(ConstraintType::AdditionalProperties) {
            Some(Constraint::AdditionalProperties(ap)) => Some(ap.clone()),
            _ => None,
        };

        let host = schema.node_mut(id);
        append_keys(host, keys, r)?;
        if let Some(theirs) = additional {
            merge_additional_properties(host, theirs, r)?;
        }
    }

    done.insert(id);
    Ok(())
}

fn append_keys(host: &mut Node, keys: Vec<ObjectKey>, r: &TypeRef) -> SchemaResult<()> {
    if let NodeKind::Object(object) = host.kind_mut() {
        for key in keys {
            if object.has_key(&key.name) {
                return Err(SchemaError::at_lex(
                    ErrorKind::DuplicateKeyInAllOf(key.name),
                    &r.lex,
                ));
            }
            object.add_key(key)?;
        }
    }
    Ok(())
}

fn merge_additional_properties(
    host: &mut Node,
    theirs: AdditionalProperties,
    r: &TypeRef,
) -> SchemaResult<()> {
    match host.constraint(ConstraintType::AdditionalProperties) {
        Some(Constraint::AdditionalProperties(ours)) => {
            if !ours.same_as(&theirs) {
                return Err(SchemaError::at_lex(
                    ErrorKind::ConflictAdditionalPropertiesInAllOf,
                    &r.lex,
                ));
            }
        }
        _ => host.set_constraint(Constraint::AdditionalProperties(theirs)),
    }
    Ok(())
}

/// Records the required keys of every object node.
pub(crate) fn compute_required_keys(schema: &mut Schema, options: &CompileOptions) {
    for index in 0..schema.node_count() {
        let id = NodeId(index);
        let required: Vec<String> = match schema.node(id).object() {
            Some(object) => object
                .keys()
                .filter(|key| is_required(schema.node(key.child), options))
                .map(|key| key.name.clone())
                .collect(),
            None => continue,
        };
        schema
            .node_mut(id)
            .set_constraint(Constraint::RequiredKeys(required));
    }
}

fn is_required(child: &Node, options: &CompileOptions) -> bool {
    match child.optional() {
        Some(optional) => !optional,
        None => !options.keys_optional_by_default,
    }
}
