//! Backend-agnostic display types for diagram output.

use crate::schema::Column;

/// Display class of a column's raw type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayType {
    /// Variable-length string with optional length.
    VarChar(Option<i32>),
    Int,
    BigInt,
    /// Decimal with `(precision, scale)` when both are known.
    Decimal(Option<(i32, i32)>),
    Bool,
    Date,
    Timestamp,
    /// Unrecognised raw type, kept as reported.
    Other(String),
}

/// Stand-in for columns declared without a type (SQLite allows these).
pub const UNTYPED: &str = "any";

impl DisplayType {
    /// Classify a column by its raw type name, case-insensitively.
    pub fn of(column: &Column) -> Self {
        let lower = column.data_type.trim().to_lowercase();
        if lower.is_empty() {
            return Self::Other(UNTYPED.to_string());
        }

        match lower.as_str() {
            "varchar" | "text" | "char" | "string" | "character varying" | "character" => {
                Self::VarChar(column.length)
            }
            "int" | "integer" | "int4" | "smallint" | "int2" => Self::Int,
            "bigint" | "int8" => Self::BigInt,
            "decimal" | "numeric" => match (column.precision, column.scale) {
                (Some(p), Some(s)) => Self::Decimal(Some((p, s))),
                _ => Self::Decimal(None),
            },
            "boolean" | "bool" => Self::Bool,
            "date" => Self::Date,
            "timestamp" | "datetime" | "timestamptz" | "timestamp without time zone"
            | "timestamp with time zone" => Self::Timestamp,
            _ => Self::Other(column.data_type.clone()),
        }
    }
}

/// Upper-case spelling shared by PlantUML and Graphviz.
pub(crate) fn sized(base: &str, display: &DisplayType) -> Option<String> {
    match display {
        DisplayType::VarChar(Some(len)) => Some(format!("{}({})", base, len)),
        DisplayType::Decimal(Some((p, s))) => Some(format!("{}({},{})", base, p, s)),
        _ => None,
    }
}

/// Replace characters that are not valid in diagram identifiers.
pub(crate) fn clean_identifier(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '-' | '.' | '"' | '\'' | '{' | '}' | ':' => '_',
            c if c.is_whitespace() => '_',
            other => other,
        })
        .collect()
}
