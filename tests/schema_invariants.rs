//! Schema Invariant Tests
//!
//! Whole-pipeline properties of schema loading, compiling and checking:
//! - Scanner events are properly nested
//! - Checking is repeatable and read-only
//! - `enum`, `or`, `any` and type references exclude other rules
//! - Recursion through references is rejected, recursion through children is not
//! - `allOf` merging is ordered and rejects duplicate keys
//! - Precision values are validated

use jschema::lexeme::{LexEvent, LexEventType};
use jschema::scanner::Scanner;
use jschema::{CompileOptions, MemoryLogger, NopLogger, Schema, SchemaResult, SourceFile};
use std::io::Write;
use tempfile::NamedTempFile;

// =============================================================================
// Helper Functions
// =============================================================================

fn compiled(types: &[(&str, &str)], root: &str) -> SchemaResult<Schema> {
    let mut schema = Schema::new();
    for (name, text) in types {
        schema.add_type(name, SourceFile::new(*name, *text))?;
    }
    schema.load_root(SourceFile::new("root", root))?;
    schema.compile(&CompileOptions::default())?;
    Ok(schema)
}

fn check(types: &[(&str, &str)], root: &str) -> SchemaResult<()> {
    compiled(types, root)?.check(&NopLogger)
}

fn check_code(types: &[(&str, &str)], root: &str) -> u16 {
    match check(types, root) {
        Ok(()) => panic!("schema {:?} passed the check", root),
        Err(err) => err.code(),
    }
}

const PETS: &str = "{
  \"id\": 1, // {min: 1}
  \"name\": \"Tom\", // {minLength: 1, maxLength: 30} - Display name
  \"tags\": [
    \"cute\"
  ],
  \"owner\": @person, // {nullable: true}
  \"kind\": \"cat\" // {enum: [\"cat\", \"dog\"]}
}";

const PERSON: &str = "{
  \"email\": \"tom@example.com\", // {type: \"email\"}
  \"born\": \"2020-01-31\" // {type: \"date\", optional: true}
}";

// =============================================================================
// Scanner Tests
// =============================================================================

/// Every opening event is closed by its counterpart, innermost first.
#[test]
fn test_scanner_events_are_nested() {
    let events: Vec<LexEvent> = Scanner::new(SourceFile::anonymous(PETS))
        .collect::<SchemaResult<_>>()
        .unwrap();

    let mut open: Vec<LexEventType> = Vec::new();
    for lex in &events {
        let kind = lex.kind();
        if kind.is_opening() {
            open.push(kind);
        } else if !matches!(kind, LexEventType::NewLine | LexEventType::EndTop) {
            let top = open.pop().expect("closing event without opening");
            assert_eq!(top.closing(), Some(kind));
        }
    }
    assert!(open.is_empty());
    assert_eq!(events.last().map(LexEvent::kind), Some(LexEventType::EndTop));
}

// =============================================================================
// Check Tests
// =============================================================================

/// A consistent schema passes, and passes again.
#[test]
fn test_check_is_idempotent() {
    let schema = compiled(&[("@person", PERSON)], PETS).unwrap();
    let logger = MemoryLogger::new();
    for _ in 0..3 {
        assert!(schema.check(&logger).is_ok());
    }
    assert_eq!(logger.events("CHECK_OK").len(), 3);
    assert!(logger.events("CHECK_FAILED").is_empty());
}

/// `enum` tolerates no other rule.
#[test]
fn test_enum_exclusivity() {
    assert!(check(&[], "\"white\" // {enum: [\"white\", \"black\"]}").is_ok());
    assert_eq!(
        check_code(&[], "\"white\" // {enum: [\"white\", \"black\"], min: 0}"),
        1402
    );
    assert_eq!(
        check_code(&[], "\"white\" // {enum: [\"white\", \"black\"], minLength: 1}"),
        1402
    );
}

/// `type: "any"` tolerates `precision`, which is then held to the example type.
#[test]
fn test_any_precision_carve_out() {
    assert!(check(&[], "1.25 // {type: \"any\", precision: 2}").is_ok());
    assert_eq!(check_code(&[], "\"x\" // {type: \"any\", precision: 2}"), 1401);
    assert_eq!(check_code(&[], "1.25 // {type: \"any\", min: 0}"), 1404);
}

/// Recursion through references cannot be resolved.
#[test]
fn test_reference_recursion_fails() {
    assert_eq!(check_code(&[("@t", "@t")], "@t"), 1410);
    assert_eq!(check_code(&[("@a", "@b"), ("@b", "@a")], "@a"), 1410);
    assert_eq!(
        check_code(&[("@t", "1 // {or: [\"@t\", \"string\"]}")], "@t"),
        1410
    );
}

/// Recursion through an object child is a legitimate shape.
#[test]
fn test_recursive_object_type_is_valid() {
    let node = "{
  \"value\": 1,
  \"next\": @node // {nullable: true}
}";
    let schema = compiled(&[("@node", node)], "@node").unwrap();
    assert!(schema.check(&NopLogger).is_ok());

    let document = "{\"value\": 1, \"next\": {\"value\": 2, \"next\": null}}";
    assert!(schema
        .validate(SourceFile::anonymous(document), &NopLogger)
        .is_ok());

    let broken = "{\"value\": 1, \"next\": {\"value\": \"two\", \"next\": null}}";
    assert!(schema
        .validate(SourceFile::anonymous(broken), &NopLogger)
        .is_err());
}

/// Unknown names are reported where they are written.
#[test]
fn test_unknown_type_is_positioned() {
    let root = "{\n  \"owner\": @nobody\n}";
    let err = check(&[], root).unwrap_err();
    assert_eq!(err.code(), 1409);
    assert_eq!(err.line(), Some(2));
    assert_eq!(err.index(), Some(13));
}

// =============================================================================
// allOf Tests
// =============================================================================

/// Own keys come first, merged keys follow in declaration order.
#[test]
fn test_all_of_merge_order() {
    let base = "{\n  \"id\": 1,\n  \"created\": \"2020-01-01\"\n}";
    let root = "{ // {allOf: \"@base\"}\n  \"name\": \"Tom\"\n}";
    let schema = compiled(&[("@base", base)], root).unwrap();
    assert!(schema.check(&NopLogger).is_ok());

    let object = schema.node(schema.root().unwrap()).object().unwrap();
    let keys: Vec<&str> = object.keys().map(|k| k.name.as_str()).collect();
    assert_eq!(keys, vec!["name", "id", "created"]);

    let document = "{\"id\": 3, \"name\": \"Tom\", \"created\": \"x\"}";
    assert!(schema
        .validate(SourceFile::anonymous(document), &NopLogger)
        .is_ok());
    let missing = "{\"name\": \"Tom\", \"created\": \"x\"}";
    let err = schema
        .validate(SourceFile::anonymous(missing), &NopLogger)
        .unwrap_err();
    assert_eq!(err.code(), 1504);
}

/// A key present on both sides of a merge is ambiguous.
#[test]
fn test_all_of_duplicate_key_fails() {
    let base = "{\n  \"id\": 1\n}";
    let root = "{ // {allOf: \"@base\"}\n  \"id\": 2\n}";
    let err = compiled(&[("@base", base)], root).unwrap_err();
    assert_eq!(err.code(), 1602);
}

/// Merging happens once, however often the schema is compiled.
#[test]
fn test_compile_twice_does_not_merge_twice() {
    let base = "{\n  \"id\": 1\n}";
    let root = "{ // {allOf: \"@base\"}\n  \"name\": \"Tom\"\n}";
    let mut schema = compiled(&[("@base", base)], root).unwrap();
    schema.compile(&CompileOptions::keys_optional()).unwrap();
    let object = schema.node(schema.root().unwrap()).object().unwrap();
    assert_eq!(object.len(), 2);

    let partial = "{\"name\": \"Tom\"}";
    assert!(schema
        .validate(SourceFile::anonymous(partial), &NopLogger)
        .is_ok());
}

// =============================================================================
// Precision Tests
// =============================================================================

#[test]
fn test_precision_values() {
    assert!(check(&[], "1.00 // {precision: 2}").is_ok());
    assert_eq!(check_code(&[], "1.0 // {precision: 0}"), 1302);
    assert_eq!(check_code(&[], "1.0 // {precision: -1}"), 1301);
    assert_eq!(check_code(&[], "1.0 // {precision: 1.5}"), 1301);
}

#[test]
fn test_precision_limits_documents() {
    let schema = compiled(&[], "1.25 // {precision: 2}").unwrap();
    assert!(schema.validate_literal(b"3.5").is_ok());
    assert!(schema.validate_literal(b"3").is_ok());
    assert_eq!(schema.validate_literal(b"3.125").unwrap_err().code(), 1502);
}

/// Bounds with extreme exponents are compared exactly and reported in
/// exponent form.
#[test]
fn test_extreme_exponent_rules() {
    let err = check(&[], "5 // {max: 1e-9223372036854775807}").unwrap_err();
    assert_eq!(err.code(), 1502);
    assert!(err.message().contains("1e-9223372036854775807"));

    assert!(check(
        &[],
        "5 // {min: -1e9223372036854775807, max: 1e99999999999999999999}"
    )
    .is_ok());
    assert_eq!(check_code(&[], "5 // {min: 1e12}"), 1502);
}

/// The same value written at different scales is the same bound.
#[test]
fn test_bounds_across_exponent_scales() {
    assert!(check(&[], "1200 // {min: 1.2e3, max: 12e2}").is_ok());
    assert!(check(&[], "0.0012 // {min: 12e-4, max: 0.12e-1}").is_ok());
    assert_eq!(check_code(&[], "1199 // {min: 1.2e3}"), 1502);
    assert_eq!(check_code(&[], "0.0013 // {max: 12e-4}"), 1502);
}

// =============================================================================
// Source Tests
// =============================================================================

/// Schemas and types can be read from files.
#[test]
fn test_load_from_files() {
    let mut person = NamedTempFile::new().unwrap();
    person.write_all(PERSON.as_bytes()).unwrap();
    let mut root = NamedTempFile::new().unwrap();
    root.write_all(b"[\n  @person\n]").unwrap();

    let mut schema = Schema::new();
    schema.add_type_from_file("@person", person.path()).unwrap();
    schema.load_root(SourceFile::new("root", "[\n  @person\n]")).unwrap();
    schema.compile(&CompileOptions::default()).unwrap();
    assert!(schema.check(&NopLogger).is_ok());

    let loaded = Schema::from_file(root.path()).unwrap();
    assert!(loaded.root().is_some());

    let err = Schema::from_file(root.path().with_extension("missing")).unwrap_err();
    assert_eq!(err.code(), 1105);
}
