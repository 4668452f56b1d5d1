//! Catalog-query extraction through `information_schema` and `pg_catalog`
//! (PostgreSQL).

use super::executor::{QueryError, QueryExecutor, Row};
use super::ExtractStep;
use crate::driver::Backend;
use crate::error::{Error, Result};
use crate::filter::FilterPolicy;
use crate::schema::{Column, ForeignKey, Schema, Table, View};
use std::collections::HashSet;
use tracing::debug;

// Catalog columns are domains (`sql_identifier`, `cardinal_number`), so every
// output and parameter is cast to a plain type.
const TABLES_QUERY: &str = r#"
    SELECT
        t.table_name::text,
        t.table_type::text,
        COALESCE(obj_description(c.oid, 'pg_class'), '')
    FROM information_schema.tables t
    LEFT JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
    LEFT JOIN pg_catalog.pg_class c ON c.relname = t.table_name AND c.relnamespace = n.oid
    WHERE t.table_schema = $1::text AND t.table_type = 'BASE TABLE'
    ORDER BY t.table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        c.column_name::text,
        c.data_type::text,
        c.character_maximum_length::int4,
        c.numeric_precision::int4,
        c.numeric_scale::int4,
        c.is_nullable::text,
        c.column_default::text,
        COALESCE(col_description(pc.oid, c.ordinal_position::int4), '')
    FROM information_schema.columns c
    LEFT JOIN pg_catalog.pg_namespace n ON n.nspname = c.table_schema
    LEFT JOIN pg_catalog.pg_class pc ON pc.relname = c.table_name AND pc.relnamespace = n.oid
    WHERE c.table_schema = $1::text AND c.table_name = $2::text
    ORDER BY c.ordinal_position
"#;

const PRIMARY_KEYS_QUERY: &str = r#"
    SELECT kcu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON kcu.constraint_schema = tc.constraint_schema
        AND kcu.constraint_name = tc.constraint_name
        AND kcu.table_name = tc.table_name
    WHERE tc.table_schema = $1::text
        AND tc.table_name = $2::text
        AND tc.constraint_type = 'PRIMARY KEY'
    ORDER BY kcu.ordinal_position
"#;

const VIEWS_QUERY: &str = r#"
    SELECT table_name::text, view_definition::text
    FROM information_schema.views
    WHERE table_schema = $1::text
    ORDER BY table_name
"#;

// Constraint names are only unique per table, so foreign keys are read from
// `pg_constraint` by oid. Key columns pair up by position in `conkey`/`confkey`.
const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT
        con.conname::text,
        cl.relname::text,
        att.attname::text,
        rcl.relname::text,
        ratt.attname::text,
        (CASE con.confupdtype
            WHEN 'a' THEN 'NO ACTION'
            WHEN 'r' THEN 'RESTRICT'
            WHEN 'c' THEN 'CASCADE'
            WHEN 'n' THEN 'SET NULL'
            WHEN 'd' THEN 'SET DEFAULT'
        END)::text,
        (CASE con.confdeltype
            WHEN 'a' THEN 'NO ACTION'
            WHEN 'r' THEN 'RESTRICT'
            WHEN 'c' THEN 'CASCADE'
            WHEN 'n' THEN 'SET NULL'
            WHEN 'd' THEN 'SET DEFAULT'
        END)::text
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
    JOIN pg_catalog.pg_namespace ns ON ns.oid = cl.relnamespace
    JOIN pg_catalog.pg_class rcl ON rcl.oid = con.confrelid
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
        WITH ORDINALITY AS k(attnum, ref_attnum, position)
    JOIN pg_catalog.pg_attribute att
        ON att.attrelid = con.conrelid AND att.attnum = k.attnum
    JOIN pg_catalog.pg_attribute ratt
        ON ratt.attrelid = con.confrelid AND ratt.attnum = k.ref_attnum
    WHERE con.contype = 'f'
        AND ns.nspname = $1::text
    ORDER BY cl.relname, con.conname, k.position
"#;

pub(super) fn extract(
    exec: &mut dyn QueryExecutor,
    namespace: &str,
    include_views: bool,
    filter: &FilterPolicy,
) -> Result<Schema> {
    let mut schema = Schema::new(Backend::Postgres);

    schema.tables = load_tables(exec, namespace, filter)?;

    if include_views {
        schema.views = load_views(exec, namespace, filter)?;
    }

    schema.foreign_keys = load_foreign_keys(exec, namespace, filter)?;

    Ok(schema)
}

fn load_tables(
    exec: &mut dyn QueryExecutor,
    namespace: &str,
    filter: &FilterPolicy,
) -> Result<Vec<Table>> {
    let fail = |e| Error::extraction(ExtractStep::Tables, None, e);
    let rows = exec.query(TABLES_QUERY, &[namespace]).map_err(fail)?;

    let mut tables = Vec::new();
    for row in rows {
        let name = row.text(0).map_err(fail)?;
        if !filter.includes(&name) {
            debug!(table = %name, "Skipping filtered table");
            continue;
        }

        let mut table = Table {
            kind: row.text(1).map_err(fail)?,
            comment: row.opt_text(2).map_err(fail)?.unwrap_or_default(),
            schema: namespace.to_string(),
            columns: load_columns(exec, namespace, &name, ExtractStep::Columns)?,
            name,
            ..Table::default()
        };

        table.primary_keys = load_primary_keys(exec, namespace, &table.name)?;
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

fn load_columns(
    exec: &mut dyn QueryExecutor,
    namespace: &str,
    relation: &str,
    step: ExtractStep,
) -> Result<Vec<Column>> {
    let fail = |e| Error::extraction(step, Some(relation), e);
    let rows = exec.query(COLUMNS_QUERY, &[namespace, relation]).map_err(fail)?;
    rows.iter().map(column_from_row).collect::<std::result::Result<_, _>>().map_err(fail)
}

fn column_from_row(row: &Row) -> std::result::Result<Column, QueryError> {
    Ok(Column {
        name: row.text(0)?,
        data_type: row.text(1)?,
        length: opt_i32(row, 2)?,
        precision: opt_i32(row, 3)?,
        scale: opt_i32(row, 4)?,
        is_nullable: row.text(5)?.eq_ignore_ascii_case("YES"),
        default_value: row.opt_text(6)?,
        is_primary_key: false,
        is_unique: false,
        comment: row.opt_text(7)?.unwrap_or_default(),
    })
}

fn opt_i32(row: &Row, index: usize) -> std::result::Result<Option<i32>, QueryError> {
    row.opt_int(index)?
        .map(|v| {
            i32::try_from(v).map_err(|_| QueryError::Invariant(format!("column {index}: {v} does not fit in i32")))
        })
        .transpose()
}

fn load_primary_keys(exec: &mut dyn QueryExecutor, namespace: &str, table: &str) -> Result<Vec<String>> {
    let fail = |e| Error::extraction(ExtractStep::PrimaryKeys, Some(table), e);
    let rows = exec.query(PRIMARY_KEYS_QUERY, &[namespace, table]).map_err(fail)?;
    rows.iter().map(|row| row.text(0)).collect::<std::result::Result<_, _>>().map_err(fail)
}

fn load_views(exec: &mut dyn QueryExecutor, namespace: &str, filter: &FilterPolicy) -> Result<Vec<View>> {
    let fail = |e| Error::extraction(ExtractStep::Views, None, e);
    let rows = exec.query(VIEWS_QUERY, &[namespace]).map_err(fail)?;

    let mut views = Vec::new();
    for row in rows {
        let name = row.text(0).map_err(fail)?;
        if !filter.includes(&name) {
            debug!(view = %name, "Skipping filtered view");
            continue;
        }

        let view = View {
            definition: row.opt_text(1).map_err(fail)?.unwrap_or_default(),
            schema: namespace.to_string(),
            columns: load_columns(exec, namespace, &name, ExtractStep::ViewColumns)?,
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
    namespace: &str,
    filter: &FilterPolicy,
) -> Result<Vec<ForeignKey>> {
    let fail = |e| Error::extraction(ExtractStep::ForeignKeys, None, e);
    let rows = exec.query(FOREIGN_KEYS_QUERY, &[namespace]).map_err(fail)?;

    let mut keys = Vec::new();
    let mut seen = HashSet::new();
    for row in rows {
        let fk = ForeignKey {
            name: row.text(0).map_err(fail)?,
            table: row.text(1).map_err(fail)?,
            column: row.text(2).map_err(fail)?,
            referenced_table: row.text(3).map_err(fail)?,
            referenced_column: row.text(4).map_err(fail)?,
            on_update: row.text(5).map_err(fail)?,
            on_delete: row.text(6).map_err(fail)?,
        };

        if !seen.insert((fk.table.clone(), fk.name.clone(), fk.column.clone())) {
            return Err(fail(QueryError::Invariant(format!(
                "foreign key {} listed twice for {}.{}",
                fk.name, fk.table, fk.column
            ))));
        }

        if !filter.includes_relation(&fk.table, &fk.referenced_table) {
            debug!(foreign_key = %fk.name, "Skipping filtered foreign key");
            continue;
        }
        keys.push(fk);
    }

    debug!("Loaded {} foreign keys", keys.len());
    Ok(keys)
}
