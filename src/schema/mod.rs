//! Schema bundle
//!
//! A [`Schema`] owns the node arena, the root example and the registry of
//! named types. It is built by the loader, rewritten once by the compile
//! passes and read-only afterwards: checking and validation only borrow it.
//!
//! # Lifecycle
//!
//! 1. `load` / `add_type*` scan and load sources into nodes
//! 2. `compile` merges `allOf` rules and computes required keys
//! 3. `check` verifies the schema is self-consistent
//! 4. `validate` checks documents against the root

mod node;
mod resolver;

pub use node::{ArrayNode, Node, NodeId, NodeKind, ObjectKey, ObjectNode};
pub use resolver::Target;

use std::path::Path;

use crate::ast::Ast;
use crate::checker;
use crate::collections::OrderedMap;
use crate::config::CompileOptions;
use crate::constraint::is_user_type_name;
use crate::errors::{ErrorKind, SchemaResult};
use crate::loader;
use crate::observability::Logger;
use crate::scanner::Scanner;
use crate::source::SourceFile;
use crate::validator;

/// A named type registered with the schema.
#[derive(Debug, Clone)]
pub struct UserType {
    pub name: String,
    pub root: NodeId,
    /// Source the type was loaded from
    pub file: SourceFile,
    /// Created from an `or` rule set rather than declared by the caller
    pub generated: bool,
}

/// Descriptive fields carried along with the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub version: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Root example, named types and the nodes they are made of.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    file: Option<SourceFile>,
    types: OrderedMap<String, UserType>,
    metadata: Metadata,
    generated_types: usize,
    all_of_merged: bool,
}

impl Schema {
    /// Creates an empty schema; types can be added before the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a schema whose root example is the whole file.
    pub fn load(file: SourceFile) -> SchemaResult<Self> {
        let mut schema = Self::new();
        schema.load_root(file)?;
        Ok(schema)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        Self::load(read_file(path.as_ref())?)
    }

    /// Loads the root example into this schema.
    pub fn load_root(&mut self, file: SourceFile) -> SchemaResult<NodeId> {
        if self.root.is_some() {
            return Err(ErrorKind::Loader("root example already loaded".to_string()).into());
        }
        let root = loader::load(self, file.clone())?;
        self.root = Some(root);
        self.file = Some(file);
        Ok(root)
    }

    /// Loads a named type from a whole file.
    pub fn add_type(&mut self, name: &str, file: SourceFile) -> SchemaResult<()> {
        check_type_name(name)?;
        if self.types.contains_key(&name.to_string()) {
            return Err(ErrorKind::DuplicationOfNameOfTypes(name.to_string()).into());
        }
        let root = loader::load(self, file.clone())?;
        self.register_type(name.to_string(), root, file, false)
    }

    /// Loads a named type from the leading value of a buffer.
    ///
    /// Returns the number of bytes the type occupies, so callers can keep
    /// reading after it.
    pub fn add_type_from_prefix(&mut self, name: &str, file: SourceFile) -> SchemaResult<usize> {
        let length = Scanner::length(file.clone())?;
        self.add_type(name, file.prefix(length))?;
        Ok(length)
    }

    pub fn add_type_from_file(&mut self, name: &str, path: impl AsRef<Path>) -> SchemaResult<()> {
        let file = read_file(path.as_ref())?;
        self.add_type(name, file)
    }

    /// Runs the compile passes.
    ///
    /// `allOf` merging happens once; required keys are recomputed from the
    /// options on every call.
    pub fn compile(&mut self, options: &CompileOptions) -> SchemaResult<()> {
        if !self.all_of_merged {
            loader::merge_all_of(self)?;
            self.all_of_merged = true;
        }
        loader::compute_required_keys(self, options);
        Ok(())
    }

    /// Verifies the whole schema: root example and every type.
    pub fn check(&self, logger: &dyn Logger) -> SchemaResult<()> {
        checker::check(self, logger)
    }

    /// Validates a document against the root example.
    pub fn validate(&self, document: SourceFile, logger: &dyn Logger) -> SchemaResult<()> {
        let root = self.root_or_err()?;
        validator::validate_document(self, root, document, logger)
    }

    /// Validates a document against a named type.
    pub fn validate_as(
        &self,
        name: &str,
        document: SourceFile,
        logger: &dyn Logger,
    ) -> SchemaResult<()> {
        let root = self.type_root_or_err(name)?;
        validator::validate_document(self, root, document, logger)
    }

    /// Validates a standalone literal against the root example.
    pub fn validate_literal(&self, value: &[u8]) -> SchemaResult<()> {
        let root = self.root_or_err()?;
        validator::validate_literal_value2(self, root, value)
    }

    /// Validates a standalone literal against a named type.
    pub fn validate_type_literal(&self, name: &str, value: &[u8]) -> SchemaResult<()> {
        let root = self.type_root_or_err(name)?;
        validator::validate_literal_value2(self, root, value)
    }

    /// Exports the schema as an AST.
    pub fn ast(&self) -> Ast {
        Ast::build(self)
    }

    // ==================
    // Accessors
    // ==================

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Source of the root example.
    pub fn file(&self) -> Option<&SourceFile> {
        self.file.as_ref()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn type_root(&self, name: &str) -> Option<NodeId> {
        self.types.get(&name.to_string()).map(|t| t.root)
    }

    pub fn user_type(&self, name: &str) -> Option<&UserType> {
        self.types.get(&name.to_string())
    }

    /// Registered types in registration order, generated ones included.
    pub fn types(&self) -> impl Iterator<Item = &UserType> {
        self.types.values()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.metadata.version = Some(version.into());
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.metadata.description = Some(description.into());
    }

    // ==================
    // Arena (loader and compile passes)
    // ==================

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn register_type(
        &mut self,
        name: String,
        root: NodeId,
        file: SourceFile,
        generated: bool,
    ) -> SchemaResult<()> {
        let user_type = UserType {
            name: name.clone(),
            root,
            file,
            generated,
        };
        self.types
            .insert(name.clone(), user_type)
            .map_err(|_| ErrorKind::DuplicationOfNameOfTypes(name).into())
    }

    /// Registers a node built from an `or` rule set under a fresh name.
    pub(crate) fn register_generated_type(&mut self, root: NodeId, file: SourceFile) -> SchemaResult<String> {
        let name = format!("#{}", self.generated_types);
        self.generated_types += 1;
        self.register_type(name.clone(), root, file, true)?;
        Ok(name)
    }

    fn root_or_err(&self) -> SchemaResult<NodeId> {
        self.root
            .ok_or_else(|| ErrorKind::Loader("schema has no root example".to_string()).into())
    }

    fn type_root_or_err(&self, name: &str) -> SchemaResult<NodeId> {
        self.type_root(name)
            .ok_or_else(|| ErrorKind::TypeNotFound(name.to_string()).into())
    }
}

fn check_type_name(name: &str) -> SchemaResult<()> {
    if is_user_type_name(name) {
        Ok(())
    } else {
        Err(ErrorKind::InvalidTypeName(name.to_string()).into())
    }
}

fn read_file(path: &Path) -> SchemaResult<SourceFile> {
    SourceFile::from_file(path)
        .map_err(|e| ErrorKind::ReadFile(format!("{}: {}", path.display(), e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonType;

    fn schema(text: &str) -> Schema {
        Schema::load(SourceFile::new("root", text)).unwrap()
    }

    #[test]
    fn test_load_root_object() {
        let schema = schema("{\n  \"id\": 1,\n  \"name\": \"cat\"\n}");
        let root = schema.node(schema.root().unwrap());
        let object = root.object().unwrap();
        let names: Vec<_> = object.keys().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(root.children().len(), 2);

        let id = schema.node(object.get("id").unwrap().child);
        assert_eq!(id.json_type(), JsonType::Integer);
        assert_eq!(id.parent(), schema.root());
    }

    #[test]
    fn test_add_type_rejects_bad_and_duplicate_names() {
        let mut schema = Schema::new();
        schema.add_type("@cat", SourceFile::anonymous("{}")).unwrap();
        assert_eq!(
            schema.add_type("@cat", SourceFile::anonymous("1")).unwrap_err().code(),
            1207
        );
        assert_eq!(
            schema.add_type("cat", SourceFile::anonymous("1")).unwrap_err().code(),
            1209
        );
        assert!(schema.type_root("@cat").is_some());
    }

    #[test]
    fn test_add_type_from_prefix_returns_length() {
        let mut schema = Schema::new();
        let length = schema
            .add_type_from_prefix("@id", SourceFile::anonymous("123 // {min: 1}\n{\"x\": 1}"))
            .unwrap();
        assert_eq!(length, 15);
        let root = schema.node(schema.type_root("@id").unwrap());
        assert!(root.constraint(crate::constraint::ConstraintType::Min).is_some());
    }

    #[test]
    fn test_second_root_is_rejected() {
        let mut schema = schema("1");
        assert!(schema.load_root(SourceFile::anonymous("2")).is_err());
    }

    #[test]
    fn test_targets_follow_references() {
        let mut schema = Schema::new();
        schema.add_type("@cat", SourceFile::anonymous("{\"name\": \"Tom\"}")).unwrap();
        schema.add_type("@dog", SourceFile::anonymous("{\"bark\": true}")).unwrap();
        schema
            .load_root(SourceFile::anonymous("@cat | @dog // {nullable: true}"))
            .unwrap();

        let targets = schema.targets(schema.root().unwrap()).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], Target::Node(schema.type_root("@cat").unwrap()));
        assert_eq!(targets[2], Target::Null);
    }

    #[test]
    fn test_reference_cycle_is_detected() {
        let mut schema = Schema::new();
        schema.add_type("@a", SourceFile::anonymous("@b")).unwrap();
        schema.add_type("@b", SourceFile::anonymous("@a")).unwrap();
        let err = schema.targets(schema.type_root("@a").unwrap()).unwrap_err();
        assert_eq!(err.code(), 1410);
    }

    #[test]
    fn test_metadata() {
        let mut schema = Schema::new();
        schema.set_version("1.0");
        schema.set_title("Pets");
        assert_eq!(schema.metadata().version.as_deref(), Some("1.0"));
        assert_eq!(schema.metadata().title.as_deref(), Some("Pets"));
        assert!(schema.metadata().description.is_none());
    }
}
