//! Schema extraction.
//!
//! One extractor per backend family, selected by a single match in
//! [`extract_schema`]. Both apply the same [`FilterPolicy`].

mod catalog;
mod executor;
#[cfg(test)]
mod mock;
mod pragma;

pub use executor::{Connection, QueryError, QueryExecutor, Row, Value};

use crate::config::SchemaConfig;
use crate::driver::Backend;
use crate::error::{Error, Result};
use crate::filter::FilterPolicy;
use crate::schema::{Schema, Table};
use std::fmt;
use tracing::{Level, info, span};

/// Extraction stage, reported when a query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStep {
    Tables,
    Columns,
    PrimaryKeys,
    Views,
    ViewColumns,
    ForeignKeys,
}

impl fmt::Display for ExtractStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::PrimaryKeys => "primary keys",
            Self::Views => "views",
            Self::ViewColumns => "view columns",
            Self::ForeignKeys => "foreign keys",
        };
        f.write_str(name)
    }
}

/// Extract a complete schema snapshot from `executor`.
pub fn extract_schema(
    backend: Backend,
    executor: &mut dyn QueryExecutor,
    config: &SchemaConfig,
) -> Result<Schema> {
    let span = span!(Level::INFO, "extract_schema", backend = %backend);
    let _enter = span.enter();

    let filter = FilterPolicy::new(&config.include_tables, &config.exclude_tables);

    let schema = match backend {
        Backend::Postgres => {
            let namespace = config
                .namespace
                .as_deref()
                .unwrap_or(backend.default_namespace());
            catalog::extract(executor, namespace, config.include_views, &filter)?
        }
        Backend::Sqlite => pragma::extract(executor, config.include_views, &filter)?,
    };

    info!(
        tables = schema.tables.len(),
        views = schema.views.len(),
        foreign_keys = schema.foreign_keys.len(),
        "Schema extracted"
    );
    Ok(schema)
}

/// Flag key columns, failing if a key names a column the table lacks.
fn apply_primary_keys(table: &mut Table) -> Result<()> {
    let dangling = table.dangling_primary_keys();
    if !dangling.is_empty() {
        let message = format!("primary key references unknown column(s): {}", dangling.join(", "));
        return Err(Error::extraction(
            ExtractStep::PrimaryKeys,
            Some(&table.name),
            QueryError::Invariant(message),
        ));
    }

    for column in &mut table.columns {
        if table.primary_keys.contains(&column.name) {
            column.is_primary_key = true;
        }
    }
    Ok(())
}
