//! PlantUML entity diagram output.

use super::types::{DisplayType, clean_identifier, sized};
use crate::schema::{Column, Schema};

pub fn render(schema: &Schema) -> String {
    let mut output = String::new();

    output.push_str("@startuml\n");
    output.push_str("!theme plain\n");
    output.push_str("skinparam linetype ortho\n\n");

    for table in &schema.tables {
        output.push_str(&format!(
            "entity \"{}\" as {} {{\n",
            table.name.replace('"', "'"),
            clean_identifier(&table.name)
        ));

        // Key columns sit above the separator, in ordinal order.
        for column in table.columns.iter().filter(|c| c.is_primary_key) {
            output.push_str(&format!(
                "  * {} : {} <<PK>>\n",
                clean_identifier(&column.name),
                display_type(column)
            ));
        }

        output.push_str("  --\n");

        for column in table.columns.iter().filter(|c| !c.is_primary_key) {
            let marker = if column.is_nullable { "" } else { " <<NOT NULL>>" };
            output.push_str(&format!(
                "  {} : {}{}\n",
                clean_identifier(&column.name),
                display_type(column),
                marker
            ));
        }

        output.push_str("}\n\n");
    }

    for view in &schema.views {
        output.push_str(&format!(
            "entity \"{}\" as {} <<view>> {{\n",
            view.name.replace('"', "'"),
            clean_identifier(&view.name)
        ));
        for column in &view.columns {
            output.push_str(&format!(
                "  {} : {}\n",
                clean_identifier(&column.name),
                display_type(column)
            ));
        }
        output.push_str("}\n\n");
    }

    for fk in &schema.foreign_keys {
        output.push_str(&format!(
            "{} ||--o{{ {} : {}\n",
            clean_identifier(&fk.referenced_table),
            clean_identifier(&fk.table),
            clean_identifier(&fk.column)
        ));
    }

    output.push_str("\n@enduml\n");

    output
}

fn display_type(column: &Column) -> String {
    let display = DisplayType::of(column);
    match &display {
        DisplayType::VarChar(_) => sized("VARCHAR", &display).unwrap_or_else(|| "VARCHAR".into()),
        DisplayType::Decimal(_) => sized("DECIMAL", &display).unwrap_or_else(|| "DECIMAL".into()),
        DisplayType::Int => "INTEGER".into(),
        DisplayType::BigInt => "BIGINT".into(),
        DisplayType::Bool => "BOOLEAN".into(),
        DisplayType::Date => "DATE".into(),
        DisplayType::Timestamp => "TIMESTAMP".into(),
        DisplayType::Other(raw) => raw.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Backend;
    use crate::schema::{ForeignKey, Table, View};

    fn orders() -> Table {
        Table {
            name: "order-items".to_string(),
            columns: vec![
                Column::new("quantity", "integer").not_null(),
                Column::new("id", "bigint").primary_key(),
                Column::new("price", "numeric").with_precision(10, 2),
                Column::new("meta", "jsonb"),
            ],
            primary_keys: vec!["id".to_string()],
            ..Table::default()
        }
    }

    #[test]
    fn test_empty_schema_is_valid_document() {
        let out = render(&Schema::new(Backend::Sqlite));
        assert!(out.starts_with("@startuml\n"));
        assert!(out.ends_with("@enduml\n"));
        assert!(!out.contains("entity"));
    }

    #[test]
    fn test_keys_above_separator() {
        let mut schema = Schema::new(Backend::Postgres);
        schema.tables.push(orders());
        let out = render(&schema);

        let expected = "entity \"order-items\" as order_items {\n\
                        \x20 * id : BIGINT <<PK>>\n\
                        \x20 --\n\
                        \x20 quantity : INTEGER <<NOT NULL>>\n\
                        \x20 price : DECIMAL(10,2)\n\
                        \x20 meta : JSONB\n\
                        }\n";
        assert!(out.contains(expected), "{}", out);
    }

    #[test]
    fn test_view_and_relationship() {
        let mut schema = Schema::new(Backend::Postgres);
        schema.views.push(View {
            name: "recent_orders".to_string(),
            columns: vec![Column::new("label", "varchar").with_length(40).not_null()],
            ..View::default()
        });
        schema.foreign_keys.push(ForeignKey {
            table: "order-items".to_string(),
            column: "order_id".to_string(),
            referenced_table: "orders".to_string(),
            referenced_column: "id".to_string(),
            ..ForeignKey::default()
        });
        let out = render(&schema);

        assert!(out.contains("entity \"recent_orders\" as recent_orders <<view>> {\n  label : VARCHAR(40)\n}"));
        assert!(out.contains("orders ||--o{ order_items : order_id\n"));
    }

    #[test]
    fn test_untyped_and_awkward_columns() {
        let mut schema = Schema::new(Backend::Sqlite);
        schema.tables.push(Table {
            name: "say \"hi\"".to_string(),
            columns: vec![Column::new("first name", ""), Column::new("{raw}", "text")],
            ..Table::default()
        });
        let out = render(&schema);

        assert!(out.contains("entity \"say 'hi'\" as say__hi_ {\n"), "{}", out);
        assert!(out.contains("  first_name : ANY\n"));
        assert!(out.contains("  _raw_ : VARCHAR\n"));
    }
}
