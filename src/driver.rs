//! Backend detection from connection strings.

use crate::error::{Error, Result};
use std::fmt;

/// Supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Catalog-query introspection through `information_schema`.
    Postgres,
    /// Pragma-style introspection of a single database file.
    Sqlite,
}

impl Backend {
    /// Map a URI scheme to a backend family.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "postgresql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Namespace used when the caller does not pick one.
    pub fn default_namespace(&self) -> &'static str {
        match self {
            Self::Postgres => "public",
            Self::Sqlite => "main",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the query executor needs to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub backend: Backend,
    /// Connection string for Postgres, filesystem path for SQLite.
    pub target: String,
}

/// Parse a connection string into a [`ConnectionDescriptor`].
pub fn parse_connection_string(input: &str) -> Result<ConnectionDescriptor> {
    let (scheme, rest) = split_scheme(input)?;

    let backend = Backend::from_scheme(scheme).ok_or_else(|| Error::UnsupportedBackend {
        scheme: scheme.to_string(),
    })?;

    let target = match backend {
        Backend::Postgres => input.to_string(),
        Backend::Sqlite => {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(Error::invalid_connection_string(input, "missing database path"));
            }
            path.to_string()
        }
    };

    Ok(ConnectionDescriptor { backend, target })
}

/// Split `scheme:rest`, checking the scheme's shape.
fn split_scheme(input: &str) -> Result<(&str, &str)> {
    if input.trim().is_empty() {
        return Err(Error::invalid_connection_string(input, "empty connection string"));
    }

    let Some(colon) = input.find(':') else {
        return Err(Error::invalid_connection_string(input, "missing scheme"));
    };
    let (scheme, rest) = (&input[..colon], &input[colon + 1..]);

    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        Some(_) => return Err(Error::invalid_connection_string(input, "malformed scheme")),
        None => return Err(Error::invalid_connection_string(input, "missing scheme")),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return Err(Error::invalid_connection_string(input, "malformed scheme"));
    }

    Ok((scheme, rest))
}
