pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod filter;
pub mod logging;
pub mod render;
pub mod schema;

pub use error::{Error, Result};

use config::{OutputFormat, SchemaConfig};
use driver::parse_connection_string;
use extract::{Connection, extract_schema};
use render::render;
use schema::Schema;

/// Connect to the database named by `url` and extract its schema
pub fn extract(url: &str, config: &SchemaConfig) -> Result<Schema> {
    let descriptor = parse_connection_string(url)?;
    let mut connection = Connection::open(&descriptor)?;
    extract_schema(descriptor.backend, &mut connection, config)
}

/// Extract the schema behind `url` and render it as a diagram document
pub fn generate(url: &str, config: &SchemaConfig, format: OutputFormat) -> Result<String> {
    let schema = extract(url, config)?;
    Ok(render(&schema, format))
}
