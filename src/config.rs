//! Compilation options
//!
//! Callers choose how undeclared optionality is read when a schema is
//! compiled. Options can be built in code or read from JSON.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, SchemaError, SchemaResult};

/// Options for [`Schema::compile`](crate::schema::Schema::compile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Object keys without an `optional` rule are optional instead of
    /// required.
    pub keys_optional_by_default: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            keys_optional_by_default: false,
        }
    }
}

impl CompileOptions {
    /// Keys are required unless marked `optional: true`.
    pub fn keys_required() -> Self {
        Self::default()
    }

    /// Keys are optional unless marked `optional: false`.
    pub fn keys_optional() -> Self {
        Self {
            keys_optional_by_default: true,
        }
    }

    /// Reads options from a JSON object; missing fields keep their defaults.
    pub fn from_json(text: &str) -> SchemaResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| SchemaError::new(ErrorKind::Loader(format!("compile options: {}", e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requires_keys() {
        let options = CompileOptions::default();
        assert!(!options.keys_optional_by_default);
        assert_eq!(options, CompileOptions::keys_required());
    }

    #[test]
    fn test_keys_optional() {
        assert!(CompileOptions::keys_optional().keys_optional_by_default);
    }

    #[test]
    fn test_from_json() {
        let options = CompileOptions::from_json(r#"{"keysOptionalByDefault": true}"#).unwrap();
        assert!(options.keys_optional_by_default);
        assert_eq!(CompileOptions::from_json("{}").unwrap(), CompileOptions::default());
        assert!(CompileOptions::from_json("[").is_err());
    }
}
