//! Configuration loading and validation.

use crate::driver::parse_connection_string;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub output: OutputConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Output path; `schema.<ext>` when unset.
    pub file: Option<PathBuf>,
}

/// What to extract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub include_views: bool,
    /// Only these tables (empty = no restriction).
    pub include_tables: Vec<String>,
    pub exclude_tables: Vec<String>,
    /// Namespace for catalog-query backends; `public` when unset.
    pub namespace: Option<String>,
}

/// Diagram notation to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mermaid,
    PlantUml,
    Graphviz,
}

impl OutputFormat {
    pub fn variants() -> &'static [&'static str] {
        &["mermaid", "plantuml", "graphviz"]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::PlantUml => "plantuml",
            Self::Graphviz => "graphviz",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mermaid => "md",
            Self::PlantUml => "puml",
            Self::Graphviz => "dot",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mermaid" => Ok(Self::Mermaid),
            "plantuml" => Ok(Self::PlantUml),
            "graphviz" | "dot" => Ok(Self::Graphviz),
            _ => Err(format!(
                "invalid format '{}'. Valid formats: {}",
                s,
                Self::variants().join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl OutputConfig {
    pub fn resolved_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("schema.{}", self.format.extension())))
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML without validating it, so flags can fill gaps first.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(Error::Config("database.url is required".into()));
        }
        parse_connection_string(&self.database.url)?;

        if let Some(ns) = &self.schema.namespace {
            if ns.trim().is_empty() {
                return Err(Error::Config("schema.namespace cannot be empty".into()));
            }
        }

        Ok(())
    }
}

/// Split a comma-separated name list, trimming blanks.
pub fn parse_name_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
