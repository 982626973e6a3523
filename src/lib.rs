//! jschema - A schema language engine for annotated JSON
//!
//! A schema is an example JSON value whose comments carry rules:
//!
//! ```text
//! {
//!   "id": 1,          // {min: 1}
//!   "name": "Tom",    // {maxLength: 30}
//!   "pet": @cat | @dog
//! }
//! ```
//!
//! Sources are scanned into lexical events, loaded into a node tree,
//! compiled (`allOf` merging, required keys), checked for consistency and
//! then used to validate documents.

pub mod ast;
mod checker;
pub mod collections;
pub mod config;
pub mod constraint;
pub mod errors;
pub mod json;
pub mod lexeme;
mod loader;
pub mod observability;
pub mod scanner;
pub mod schema;
pub mod source;
pub mod validator;

pub use config::CompileOptions;
pub use errors::{ErrorKind, SchemaError, SchemaResult};
pub use observability::{JsonLogger, Logger, MemoryLogger, NopLogger, Severity};
pub use schema::Schema;
pub use source::SourceFile;
