//! Error types for schema extraction.

use crate::driver::Backend;
use crate::extract::{ExtractStep, QueryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid connection string {input:?}: {reason}")]
    InvalidConnectionString { input: String, reason: String },

    #[error("Unsupported database scheme: {scheme}")]
    UnsupportedBackend { scheme: String },

    #[error("Failed to connect to {backend} database: {source}")]
    Connect {
        backend: Backend,
        #[source]
        source: QueryError,
    },

    #[error("Schema extraction failed while loading {step}{}: {source}", object_suffix(.object))]
    ExtractionFailed {
        step: ExtractStep,
        object: Option<String>,
        #[source]
        source: QueryError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn object_suffix(object: &Option<String>) -> String {
    match object {
        Some(name) => format!(" for {name}"),
        None => String::new(),
    }
}

impl Error {
    pub fn invalid_connection_string(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidConnectionString {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn extraction(step: ExtractStep, object: Option<&str>, source: QueryError) -> Self {
        Error::ExtractionFailed {
            step,
            object: object.map(str::to_string),
            source,
        }
    }

    /// Format error with its full cause chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

pub type Result<T> = std::result::Result<T, Error>;
