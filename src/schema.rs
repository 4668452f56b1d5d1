//! Vendor-neutral schema model.
//!
//! A [`Schema`] is built once per run by an extractor and handed, read-only,
//! to a renderer. Nothing here talks to a database.

use crate::driver::Backend;
use chrono::{DateTime, Utc};

/// Descriptive type recorded for ordinary tables, whatever the backend.
pub const BASE_TABLE: &str = "BASE TABLE";

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub backend: Backend,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub foreign_keys: Vec<ForeignKey>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub name: String,
    /// Namespace the table lives in (`public`, `main`, ...).
    pub schema: String,
    /// Backend-reported descriptive type, e.g. `BASE TABLE`.
    pub kind: String,
    /// Columns in the backend's ordinal order.
    pub columns: Vec<Column>,
    /// Primary-key column names in key order.
    pub primary_keys: Vec<String>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct View {
    pub name: String,
    pub schema: String,
    /// Raw view body as reported by the backend. Never parsed.
    pub definition: String,
    pub columns: Vec<Column>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Column {
    pub name: String,
    /// Native type name as the backend reports it.
    pub data_type: String,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub is_nullable: bool,
    /// Default expression as text; not evaluated.
    pub default_value: Option<String>,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForeignKey {
    pub name: String,
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_update: String,
    pub on_delete: String,
}

impl Schema {
    /// Empty schema stamped with the current time.
    pub fn new(backend: Backend) -> Self {
        Self::generated_at(backend, Utc::now())
    }

    pub fn generated_at(backend: Backend, generated_at: DateTime<Utc>) -> Self {
        Self {
            backend,
            tables: Vec::new(),
            views: Vec::new(),
            foreign_keys: Vec::new(),
            generated_at,
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key names that do not match any column of this table.
    pub fn dangling_primary_keys(&self) -> Vec<&str> {
        self.primary_keys
            .iter()
            .filter(|pk| self.column(pk).is_none())
            .map(|pk| pk.as_str())
            .collect()
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            ..Self::default()
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
}

impl ForeignKey {
    /// Name given to keys from backends that do not name their constraints.
    pub fn synthetic_name(table: &str, column: &str) -> String {
        format!("fk_{}_{}", table, column)
    }
}
