//! Mermaid `erDiagram` output wrapped in a markdown document.

use super::types::{DisplayType, clean_identifier};
use crate::schema::{Column, Schema};

pub fn render(schema: &Schema) -> String {
    let mut output = String::new();

    output.push_str("# Database Schema Diagram\n\n");
    output.push_str("```mermaid\nerDiagram\n");

    for table in &schema.tables {
        output.push_str(&format!("    {} {{\n", clean_identifier(&table.name)));
        for column in &table.columns {
            let key = if column.is_primary_key {
                " PK"
            } else if !column.is_nullable {
                " \"NOT NULL\""
            } else {
                ""
            };
            output.push_str(&format!(
                "        {} {}{}\n",
                display_type(column),
                attribute_word(&column.name),
                key
            ));
        }
        output.push_str("    }\n\n");
    }

    for view in &schema.views {
        output.push_str(&format!(
            "    {}[\"{} (view)\"] {{\n",
            clean_identifier(&view.name),
            view.name.replace('"', "'")
        ));
        for column in &view.columns {
            output.push_str(&format!(
                "        {} {}\n",
                display_type(column),
                attribute_word(&column.name)
            ));
        }
        output.push_str("    }\n\n");
    }

    for fk in &schema.foreign_keys {
        output.push_str(&format!(
            "    {} ||--o{{ {} : \"{}\"\n",
            clean_identifier(&fk.referenced_table),
            clean_identifier(&fk.table),
            fk.column.replace('"', "'")
        ));
    }

    output.push_str("```\n\n");
    output.push_str(&format!(
        "Generated on: {}\n",
        schema.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str(&format!("Total Tables: {}\n", schema.tables.len()));
    output.push_str(&format!("Total Views: {}\n", schema.views.len()));
    output.push_str(&format!("Total Foreign Keys: {}\n", schema.foreign_keys.len()));

    output
}

fn display_type(column: &Column) -> String {
    match DisplayType::of(column) {
        DisplayType::VarChar(Some(len)) => format!("varchar({})", len),
        DisplayType::VarChar(None) => "varchar".to_string(),
        DisplayType::Int | DisplayType::BigInt => "int".to_string(),
        // Commas are not allowed in attribute types.
        DisplayType::Decimal(Some((p, s))) => format!("decimal({}_{})", p, s),
        DisplayType::Decimal(None) => "decimal".to_string(),
        DisplayType::Bool => "boolean".to_string(),
        DisplayType::Date => "date".to_string(),
        DisplayType::Timestamp => "timestamp".to_string(),
        DisplayType::Other(raw) => attribute_word(&raw),
    }
}

/// Rewrite `text` into an erDiagram attribute word: a letter or `_` followed
/// by letters, digits, `_`, `-`, parentheses or brackets.
fn attribute_word(text: &str) -> String {
    let mut word: String = text
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '_' | '-' | '(' | ')' | '[' | ']' => c,
            _ => '_',
        })
        .collect();
    if !word.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        word.insert(0, '_');
    }
    word
}
