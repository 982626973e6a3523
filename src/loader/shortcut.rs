//! Types shortcuts
//!
//! `@cat` as a value means `{type: "@cat"}`; `@cat | @dog` means
//! `{or: ["@cat", "@dog"]}`.

use crate::constraint::{check_user_type_name, Constraint, Source, TypeConstraint, TypeRef, TypesList};
use crate::errors::SchemaResult;
use crate::json::JsonType;
use crate::lexeme::LexEvent;
use crate::schema::Node;

/// Splits a shortcut into its names, each positioned on its own text.
pub(crate) fn shortcut_names(lex: &LexEvent) -> SchemaResult<Vec<TypeRef>> {
    let mut names = Vec::new();
    let mut offset = 0;
    for part in lex.value().split(|b| *b == b'|') {
        let leading = part.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let trailing = part.iter().rev().take_while(|b| b.is_ascii_whitespace()).count();
        let begin = lex.begin() + offset + leading;
        let end = (lex.begin() + offset + part.len()).saturating_sub(trailing + 1).max(begin);
        let name_lex = LexEvent::new(lex.kind(), begin, end, lex.file().clone());

        let name = name_lex.text();
        check_user_type_name(&name, &name_lex)?;
        names.push(TypeRef::new(name, name_lex));
        offset += part.len() + 1;
    }
    Ok(names)
}

/// Expands a types shortcut into constraints on its node.
pub(crate) fn expand(node: &mut Node, lex: &LexEvent) -> SchemaResult<()> {
    let names = shortcut_names(lex)?;
    let type_name = if names.len() == 1 {
        names[0].name.clone()
    } else {
        JsonType::Mixed.as_str().to_string()
    };

    node.add_constraint(
        Constraint::Type(TypeConstraint {
            name: type_name.clone(),
            lex: lex.clone(),
            source: Source::Generated,
        }),
        lex,
    )?;
    if names.len() > 1 {
        node.add_constraint(Constraint::Or(Source::Generated), lex)?;
    }
    node.add_constraint(
        Constraint::TypesList(TypesList {
            names,
            source: Source::Generated,
        }),
        lex,
    )?;
    node.set_schema_type(type_name);
    Ok(())
}
