//! Serializable schema AST
//!
//! A plain, owned snapshot of a loaded schema for tools that want to render
//! or inspect it without walking the node arena.

use serde::Serialize;
use serde_json::Value;

use crate::constraint::{ConstraintType, Source};
use crate::json::JsonType;
use crate::schema::{Metadata, NodeId, NodeKind, Schema};

/// Exported schema.
#[derive(Debug, Clone, Serialize)]
pub struct Ast {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<AstNode>,
    /// Named types in registration order; generated ones are left out
    pub types: Vec<AstType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AstType {
    pub name: String,
    pub root: AstNode,
}

/// One rule with its value.
#[derive(Debug, Clone, Serialize)]
pub struct AstRule {
    pub name: String,
    pub value: Value,
    pub source: Source,
}

#[derive(Debug, Clone, Serialize)]
pub struct AstProperty {
    pub key: String,
    /// Key written as a type name
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub shortcut: bool,
    pub value: AstNode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstNode {
    pub json_type: JsonType,
    pub schema_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<AstRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Example literal, for scalar positions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<AstProperty>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<AstNode>>,
    /// Rule sets written inline in an `or` rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<AstNode>>,
}

impl Ast {
    pub fn build(schema: &Schema) -> Ast {
        let Metadata {
            version,
            title,
            description,
        } = schema.metadata().clone();
        Ast {
            version,
            title,
            description,
            root: schema.root().map(|root| node(schema, root)),
            types: schema
                .types()
                .filter(|t| !t.generated)
                .map(|t| AstType {
                    name: t.name.clone(),
                    root: node(schema, t.root),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn node(schema: &Schema, id: NodeId) -> AstNode {
    let n = schema.node(id);

    let mut rules: Vec<AstRule> = n
        .constraints()
        .values()
        .filter(|c| c.source() == Source::Manual)
        .map(|c| AstRule {
            name: c.name().to_string(),
            value: c.rule_value(),
            source: c.source(),
        })
        .collect();
    rules.sort_by(|a, b| a.name.cmp(&b.name));

    let example = match n.kind() {
        NodeKind::Literal if n.has_example() => serde_json::from_slice(n.value()).ok(),
        _ => None,
    };

    let properties = n.object().map(|object| {
        object
            .keys()
            .map(|key| AstProperty {
                key: key.name.clone(),
                shortcut: key.is_shortcut,
                value: node(schema, key.child),
            })
            .collect()
    });

    let items = n
        .array()
        .map(|array| array.items().iter().map(|item| node(schema, *item)).collect());

    let or = match (n.has(ConstraintType::Or), n.types_list()) {
        (true, Some(list)) => Some(
            list.names
                .iter()
                .filter_map(|r| schema.user_type(&r.name))
                .filter(|t| t.generated)
                .map(|t| node(schema, t.root))
                .collect(),
        ),
        _ => None,
    };

    AstNode {
        json_type: n.json_type(),
        schema_type: n.schema_type().to_string(),
        rules,
        comment: n.comment().map(str::to_string),
        example,
        properties,
        items,
        or,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;

    #[test]
    fn test_object_export() {
        let text = "{\n  \"id\": 1, // {min: 1} - Identifier\n  \"tags\": [\"a\"]\n}";
        let mut schema = Schema::load(SourceFile::anonymous(text)).unwrap();
        schema.set_title("Pets");
        let json = schema.ast().to_json();

        assert_eq!(json["title"], "Pets");
        let properties = json["root"]["properties"].as_array().unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0]["key"], "id");
        assert_eq!(properties[0]["value"]["jsonType"], "integer");
        assert_eq!(properties[0]["value"]["example"], 1);
        assert_eq!(properties[0]["value"]["rules"][0]["name"], "min");
        assert_eq!(properties[0]["value"]["comment"], "Identifier");
        assert_eq!(properties[1]["value"]["items"][0]["example"], "a");
    }

    #[test]
    fn test_or_alternatives_are_inlined() {
        let schema = Schema::load(SourceFile::anonymous(
            "1 // {or: [\"integer\", {type: \"string\", maxLength: 3}]}",
        ))
        .unwrap();
        let ast = schema.ast();
        assert!(ast.types.is_empty());

        let root = ast.root.unwrap();
        assert_eq!(root.schema_type, "mixed");
        let or = root.or.unwrap();
        assert_eq!(or.len(), 2);
        assert_eq!(or[0].schema_type, "integer");
        assert_eq!(or[1].rules[0].name, "maxLength");
    }

    #[test]
    fn test_shortcut_key_flag() {
        let mut schema = Schema::new();
        schema.add_type("@id", SourceFile::anonymous("\"a\"")).unwrap();
        schema.load_root(SourceFile::anonymous("{\n  @id: 1\n}")).unwrap();
        let json = schema.ast().to_json();
        assert_eq!(json["root"]["properties"][0]["shortcut"], true);
        assert_eq!(json["types"][0]["name"], "@id");
    }
}
