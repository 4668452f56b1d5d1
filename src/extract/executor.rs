//! Query execution boundary.
//!
//! Extractors only see [`QueryExecutor`]. Every call returns fully drained
//! rows, so no cursor stays open while the next statement runs.

use crate::driver::{Backend, ConnectionDescriptor};
use crate::error::{Error, Result};
use postgres::types::{ToSql, Type};
use rusqlite::OpenFlags;
use rusqlite::types::ValueRef;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("postgres: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Backend(String),

    #[error("column {index} out of range (row has {len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },

    #[error("column {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Invariant(String),
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Text(_) => "text",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A result row with typed positional access.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, index: usize) -> std::result::Result<&Value, QueryError> {
        self.values.get(index).ok_or(QueryError::ColumnOutOfRange {
            index,
            len: self.values.len(),
        })
    }

    pub fn text(&self, index: usize) -> std::result::Result<String, QueryError> {
        match self.opt_text(index)? {
            Some(s) => Ok(s),
            None => Err(QueryError::TypeMismatch {
                index,
                expected: "text",
                found: "null",
            }),
        }
    }

    pub fn opt_text(&self, index: usize) -> std::result::Result<Option<String>, QueryError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            // SQLite stores whatever it is given; defaults like `0` come back as integers.
            Value::Int(v) => Ok(Some(v.to_string())),
        }
    }

    pub fn int(&self, index: usize) -> std::result::Result<i64, QueryError> {
        match self.opt_int(index)? {
            Some(v) => Ok(v),
            None => Err(QueryError::TypeMismatch {
                index,
                expected: "integer",
                found: "null",
            }),
        }
    }

    pub fn opt_int(&self, index: usize) -> std::result::Result<Option<i64>, QueryError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v)),
            other => Err(QueryError::TypeMismatch {
                index,
                expected: "integer",
                found: other.kind(),
            }),
        }
    }
}

/// Runs parameterized introspection queries.
pub trait QueryExecutor {
    /// Run `sql` with positional text parameters and drain every row.
    fn query(&mut self, sql: &str, params: &[&str]) -> std::result::Result<Vec<Row>, QueryError>;
}

/// An open database connection, one variant per backend family.
pub enum Connection {
    Postgres(postgres::Client),
    Sqlite(rusqlite::Connection),
}

impl Connection {
    /// Open a connection for the given descriptor.
    pub fn open(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let backend = descriptor.backend;
        let connect_err = |source: QueryError| Error::Connect { backend, source };

        match backend {
            Backend::Postgres => {
                let client = postgres::Client::connect(&descriptor.target, postgres::NoTls)
                    .map_err(|e| connect_err(e.into()))?;
                debug!("Connected to postgres");
                Ok(Connection::Postgres(client))
            }
            Backend::Sqlite => {
                let conn = rusqlite::Connection::open_with_flags(
                    &descriptor.target,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(|e| connect_err(e.into()))?;
                debug!(path = %descriptor.target, "Opened sqlite database");
                Ok(Connection::Sqlite(conn))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Connection::Postgres(_) => Backend::Postgres,
            Connection::Sqlite(_) => Backend::Sqlite,
        }
    }
}

impl QueryExecutor for Connection {
    fn query(&mut self, sql: &str, params: &[&str]) -> std::result::Result<Vec<Row>, QueryError> {
        match self {
            Connection::Postgres(client) => query_postgres(client, sql, params),
            Connection::Sqlite(conn) => query_sqlite(conn, sql, params),
        }
    }
}

impl QueryExecutor for rusqlite::Connection {
    fn query(&mut self, sql: &str, params: &[&str]) -> std::result::Result<Vec<Row>, QueryError> {
        query_sqlite(self, sql, params)
    }
}

impl QueryExecutor for postgres::Client {
    fn query(&mut self, sql: &str, params: &[&str]) -> std::result::Result<Vec<Row>, QueryError> {
        query_postgres(self, sql, params)
    }
}

fn query_postgres(
    client: &mut postgres::Client,
    sql: &str,
    params: &[&str],
) -> std::result::Result<Vec<Row>, QueryError> {
    let params: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    let rows = client.query(sql, &params)?;

    rows.iter()
        .map(|row| {
            let values = row
                .columns()
                .iter()
                .enumerate()
                .map(|(i, col)| convert_pg_value(row, i, col.type_()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Row::new(values))
        })
        .collect()
}

fn convert_pg_value(
    row: &postgres::Row,
    idx: usize,
    ty: &Type,
) -> std::result::Result<Value, QueryError> {
    let value = match ty.name() {
        "int2" => row.try_get::<_, Option<i16>>(idx)?.map(i64::from).into(),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.map(i64::from).into(),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.into(),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(i64::from).into(),
        _ => row
            .try_get::<_, Option<String>>(idx)?
            .map(Value::Text)
            .unwrap_or(Value::Null),
    };
    Ok(value)
}

fn query_sqlite(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&str],
) -> std::result::Result<Vec<Row>, QueryError> {
    let mut stmt = conn.prepare(sql)?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Text(v.to_string()),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Value::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            };
            values.push(value);
        }
        out.push(Row::new(values));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_typed_access() {
        let row = Row::new(vec![
            Value::from("id"),
            Value::Null,
            Value::Int(255),
        ]);
        assert_eq!(row.text(0).unwrap(), "id");
        assert_eq!(row.opt_text(1).unwrap(), None);
        assert_eq!(row.opt_int(1).unwrap(), None);
        assert_eq!(row.int(2).unwrap(), 255);
        assert_eq!(row.opt_text(2).unwrap().as_deref(), Some("255"));
    }

    #[test]
    fn test_row_errors() {
        let row = Row::new(vec![Value::from("x"), Value::Null]);
        assert!(matches!(
            row.int(0),
            Err(QueryError::TypeMismatch { index: 0, expected: "integer", found: "text" })
        ));
        assert!(matches!(row.text(1), Err(QueryError::TypeMismatch { found: "null", .. })));
        assert!(matches!(
            row.text(5),
            Err(QueryError::ColumnOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_sqlite_query_drains_rows() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL);
             INSERT INTO t VALUES (1, 'a', 1.5), (2, NULL, NULL);",
        )
        .unwrap();

        let rows = QueryExecutor::query(&mut conn, "SELECT id, name, score FROM t WHERE id >= ?1 ORDER BY id", &["1"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].int(0).unwrap(), 1);
        assert_eq!(rows[0].text(1).unwrap(), "a");
        assert_eq!(rows[0].text(2).unwrap(), "1.5");
        assert_eq!(rows[1].opt_text(1).unwrap(), None);
    }
}
