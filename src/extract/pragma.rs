//! Pragma-style extraction (SQLite).
//!
//! Tables and views come from `sqlite_master`; columns and foreign keys come
//! from the per-table pragma functions. Constraint names do not exist here,
//! so foreign keys are named `fk_<table>_<column>`.

use super::executor::{QueryError, QueryExecutor, Row};
use super::ExtractStep;
use crate::driver::Backend;
use crate::error::{Error, Result};
use crate::filter::FilterPolicy;
use crate::schema::{BASE_TABLE, Column, ForeignKey, Schema, Table, View};
use tracing::debug;

/// Names with this prefix belong to SQLite itself.
const INTERNAL_PREFIX: &str = "sqlite_";

const NAMESPACE: &str = "main";

const TABLES_QUERY: &str = "SELECT name, type FROM sqlite_master WHERE type = 'table' ORDER BY name";

const VIEWS_QUERY: &str = "SELECT name, sql FROM sqlite_master WHERE type = 'view' ORDER BY name";

const TABLE_INFO_QUERY: &str =
    r#"SELECT cid, name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#;

const FOREIGN_KEY_LIST_QUERY: &str = r#"SELECT id, seq, "table", "from", "to", on_update, on_delete, "match" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#;

/// One row of `pragma_table_info`.
struct ColumnInfo {
    column: Column,
    /// 1-based position in the primary key, 0 when not part of it.
    pk_position: i64,
}

pub(super) fn extract(
    exec: &mut dyn QueryExecutor,
    include_views: bool,
    filter: &FilterPolicy,
) -> Result<Schema> {
    let mut schema = Schema::new(Backend::Sqlite);

    schema.tables = load_tables(exec, filter)?;

    if include_views {
        schema.views = load_views(exec, filter)?;
    }

    schema.foreign_keys = load_foreign_keys(exec, &schema.tables, filter)?;

    Ok(schema)
}

fn load_tables(exec: &mut dyn QueryExecutor, filter: &FilterPolicy) -> Result<Vec<Table>> {
    let fail = |e| Error::extraction(ExtractStep::Tables, None, e);
    let rows = exec.query(TABLES_QUERY, &[]).map_err(fail)?;

    let mut tables = Vec::new();
    for row in rows {
        let name = row.text(0).map_err(fail)?;
        if name.starts_with(INTERNAL_PREFIX) {
            continue;
        }
        if !filter.includes(&name) {
            debug!(table = %name, "Skipping filtered table");
            continue;
        }

        let columns = table_info(exec, &name)
            .map_err(|e| Error::extraction(ExtractStep::Columns, Some(&name), e))?
            .into_iter()
            .map(|info| info.column)
            .collect();

        let mut table = Table {
            schema: NAMESPACE.to_string(),
            kind: BASE_TABLE.to_string(),
            columns,
            primary_keys: load_primary_keys(exec, &name)?,
            name,
            comment: String::new(),
        };
        super::apply_primary_keys(&mut table)?;

        debug!(
            table = %table.name,
            columns = table.columns.len(),
            primary_keys = ?table.primary_keys,
            "Loaded table"
        );
        tables.push(table);
    }

    Ok(tables)
}

fn table_info(exec: &mut dyn QueryExecutor, relation: &str) -> std::result::Result<Vec<ColumnInfo>, QueryError> {
    let rows = exec.query(TABLE_INFO_QUERY, &[relation])?;
    rows.iter().map(column_info_from_row).collect()
}

fn column_info_from_row(row: &Row) -> std::result::Result<ColumnInfo, QueryError> {
    let not_null = row.int(3)?;
    let pk_position = row.int(5)?;
    let column = Column {
        name: row.text(1)?,
        data_type: row.opt_text(2)?.unwrap_or_default(),
        length: None,
        precision: None,
        scale: None,
        is_nullable: not_null == 0,
        default_value: row.opt_text(4)?,
        is_primary_key: pk_position != 0,
        is_unique: false,
        comment: String::new(),
    };
    Ok(ColumnInfo { column, pk_position })
}

/// Key columns in the order `pragma_table_info` lists them.
fn load_primary_keys(exec: &mut dyn QueryExecutor, table: &str) -> Result<Vec<String>> {
    let infos = table_info(exec, table)
        .map_err(|e| Error::extraction(ExtractStep::PrimaryKeys, Some(table), e))?;
    Ok(infos
        .into_iter()
        .filter(|info| info.pk_position != 0)
        .map(|info| info.column.name)
        .collect())
}

fn load_views(exec: &mut dyn QueryExecutor, filter: &FilterPolicy) -> Result<Vec<View>> {
    let fail = |e| Error::extraction(ExtractStep::Views, None, e);
    let rows = exec.query(VIEWS_QUERY, &[]).map_err(fail)?;

    let mut views = Vec::new();
    for row in rows {
        let name = row.text(0).map_err(fail)?;
        if !filter.includes(&name) {
            debug!(view = %name, "Skipping filtered view");
            continue;
        }

        let mut columns: Vec<Column> = table_info(exec, &name)
            .map_err(|e| Error::extraction(ExtractStep::ViewColumns, Some(&name), e))?
            .into_iter()
            .map(|info| info.column)
            .collect();
        for column in &mut columns {
            column.is_primary_key = false;
        }

        let view = View {
            definition: row.opt_text(1).map_err(fail)?.unwrap_or_default(),
            schema: NAMESPACE.to_string(),
            columns,
            name,
            comment: String::new(),
        };
        debug!(view = %view.name, columns = view.columns.len(), "Loaded view");
        views.push(view);
    }

    Ok(views)
}

fn load_foreign_keys(
    exec: &mut dyn QueryExecutor,
    tables: &[Table],
    filter: &FilterPolicy,
) -> Result<Vec<ForeignKey>> {
    let mut keys = Vec::new();

    for table in tables {
        let fail = |e| Error::extraction(ExtractStep::ForeignKeys, Some(&table.name), e);
        let rows = exec
            .query(FOREIGN_KEY_LIST_QUERY, &[table.name.as_str()])
            .map_err(fail)?;

        for row in rows {
            let seq = row.int(1).map_err(fail)?;
            let referenced_table = row.text(2).map_err(fail)?;
            let column = row.text(3).map_err(fail)?;

            if !filter.includes_relation(&table.name, &referenced_table) {
                debug!(table = %table.name, column = %column, "Skipping filtered foreign key");
                continue;
            }

            let referenced_column = match row.opt_text(4).map_err(fail)? {
                Some(col) => col,
                None => implicit_target(exec, &referenced_table, seq).map_err(fail)?,
            };

            keys.push(ForeignKey {
                name: ForeignKey::synthetic_name(&table.name, &column),
                table: table.name.clone(),
                column,
                referenced_table,
                referenced_column,
                on_update: row.text(5).map_err(fail)?,
                on_delete: row.text(6).map_err(fail)?,
            });
        }
    }

    debug!("Loaded {} foreign keys", keys.len());
    Ok(keys)
}

/// Resolve `REFERENCES parent` without a column list to the parent's key column.
fn implicit_target(
    exec: &mut dyn QueryExecutor,
    referenced_table: &str,
    seq: i64,
) -> std::result::Result<String, QueryError> {
    table_info(exec, referenced_table)?
        .into_iter()
        .find(|info| info.pk_position == seq + 1)
        .map(|info| info.column.name)
        .ok_or_else(|| {
            QueryError::Invariant(format!(
                "cannot resolve referenced column #{} of {}",
                seq + 1,
                referenced_table
            ))
        })
}
