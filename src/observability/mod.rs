//! Observability for the checker and the validator
//!
//! # Principles
//!
//! 1. Observability is read-only: logging never changes an outcome
//! 2. The logger is injected, never global
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use jschema::observability::{JsonLogger, Logger};
//!
//! let logger = JsonLogger::stderr();
//! schema.check(&logger)?;
//! ```

mod logger;

pub use logger::{JsonLogger, LogEntry, Logger, MemoryLogger, NopLogger, Severity};
