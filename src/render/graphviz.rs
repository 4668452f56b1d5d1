//! Graphviz DOT output using record-shaped nodes.

use super::types::{DisplayType, sized};
use crate::schema::{Column, Schema};

pub fn render(schema: &Schema) -> String {
    let mut output = String::new();

    output.push_str("digraph schema {\n");
    output.push_str("  rankdir=TB;\n");
    output.push_str("  node [shape=record, style=filled, fillcolor=lightblue];\n");
    output.push_str("  edge [color=gray];\n\n");

    for table in &schema.tables {
        let fields: Vec<String> = table.columns.iter().map(table_field).collect();
        output.push_str(&format!(
            "  {} [label=\"{{{}|{}\\l}}\"];\n",
            node_id(&table.name),
            escape_record(&table.name),
            fields.join("\\l")
        ));
    }

    for view in &schema.views {
        let fields: Vec<String> = view
            .columns
            .iter()
            .map(|c| format!("{}: {}", escape_record(&c.name), display_type(c)))
            .collect();
        output.push_str(&format!(
            "  {} [label=\"{{{} (VIEW)|{}\\l}}\", fillcolor=lightgreen];\n",
            node_id(&view.name),
            escape_record(&view.name),
            fields.join("\\l")
        ));
    }

    output.push('\n');

    for fk in &schema.foreign_keys {
        output.push_str(&format!(
            "  {} -> {} [label=\"{}\"];\n",
            node_id(&fk.referenced_table),
            node_id(&fk.table),
            escape_string(&fk.column)
        ));
    }

    output.push_str("}\n");

    output
}

fn table_field(column: &Column) -> String {
    let mut field = format!("{}: {}", escape_record(&column.name), display_type(column));
    if column.is_primary_key {
        field.insert(0, '+');
    } else if !column.is_nullable {
        field.push_str(" NOT NULL");
    }
    field
}

fn display_type(column: &Column) -> String {
    let display = DisplayType::of(column);
    let name = match &display {
        DisplayType::VarChar(_) => sized("VARCHAR", &display).unwrap_or_else(|| "VARCHAR".into()),
        DisplayType::Decimal(_) => sized("DECIMAL", &display).unwrap_or_else(|| "DECIMAL".into()),
        DisplayType::Int => "INT".into(),
        DisplayType::BigInt => "BIGINT".into(),
        DisplayType::Bool => "BOOL".into(),
        DisplayType::Date => "DATE".into(),
        DisplayType::Timestamp => "TIMESTAMP".into(),
        DisplayType::Other(raw) => raw.to_uppercase(),
    };
    escape_record(&name)
}

/// Node IDs are always quoted so keywords (`node`, `edge`, ...) and names
/// starting with a digit are read as node names.
fn node_id(name: &str) -> String {
    format!("\"{}\"", escape_string(name))
}

fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape characters that delimit fields inside a record label.
fn escape_record(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Backend;
    use crate::schema::{ForeignKey, Table, View};

    #[test]
    fn test_record_node() {
        let mut schema = Schema::new(Backend::Postgres);
        schema.tables.push(Table {
            name: "users".to_string(),
            columns: vec![
                Column::new("id", "integer").primary_key(),
                Column::new("email", "varchar").with_length(255).not_null(),
                Column::new("active", "bool"),
            ],
            primary_keys: vec!["id".to_string()],
            ..Table::default()
        });
        let out = render(&schema);

        assert!(out.contains(
            "  \"users\" [label=\"{users|+id: INT\\lemail: VARCHAR(255) NOT NULL\\lactive: BOOL\\l}\"];\n"
        ));
    }

    #[test]
    fn test_view_node_is_green() {
        let mut schema = Schema::new(Backend::Sqlite);
        schema.views.push(View {
            name: "active.users".to_string(),
            columns: vec![Column::new("id", "INTEGER")],
            ..View::default()
        });
        let out = render(&schema);

        assert!(out.contains(
            "  \"active.users\" [label=\"{active.users (VIEW)|id: INT\\l}\", fillcolor=lightgreen];\n"
        ));
    }

    #[test]
    fn test_edge_direction() {
        let mut schema = Schema::new(Backend::Postgres);
        schema.foreign_keys.push(ForeignKey {
            table: "orders".to_string(),
            column: "user_id".to_string(),
            referenced_table: "users".to_string(),
            referenced_column: "id".to_string(),
            ..ForeignKey::default()
        });
        let out = render(&schema);
        assert!(out.contains("  \"users\" -> \"orders\" [label=\"user_id\"];\n"));
    }

    #[test]
    fn test_escape_record() {
        assert_eq!(escape_record("a|b{c}<d>\"e\""), "a\\|b\\{c\\}\\<d\\>\\\"e\\\"");
        assert_eq!(display_type(&Column::new("t", "map<text>")), "MAP\\<TEXT\\>");
        assert_eq!(escape_record("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_keyword_and_digit_names_are_quoted() {
        let mut schema = Schema::new(Backend::Sqlite);
        for name in ["node", "edge", "2fa_codes"] {
            schema.tables.push(Table {
                name: name.to_string(),
                columns: vec![Column::new("id", "integer").primary_key(), Column::new("src", "integer")],
                primary_keys: vec!["id".to_string()],
                ..Table::default()
            });
        }
        schema.foreign_keys.push(ForeignKey {
            table: "edge".to_string(),
            column: "src".to_string(),
            referenced_table: "node".to_string(),
            referenced_column: "id".to_string(),
            ..ForeignKey::default()
        });
        let out = render(&schema);

        assert!(out.contains("  \"node\" [label=\"{node|+id: INT\\lsrc: INT\\l}\"];\n"), "{}", out);
        assert!(out.contains("  \"edge\" [label="));
        assert!(out.contains("  \"2fa_codes\" [label="));
        assert!(out.contains("  \"node\" -> \"edge\" [label=\"src\"];\n"));
        // Only the two default-attribute statements from the header remain unquoted.
        assert_eq!(out.lines().filter(|l| l.starts_with("  node [") || l.starts_with("  edge [")).count(), 2);
    }

    #[test]
    fn test_quotes_in_names_are_escaped() {
        assert_eq!(node_id("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(node_id("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn test_untyped_column_gets_placeholder() {
        assert_eq!(display_type(&Column::new("payload", "")), "ANY");
    }
}
