//! Diagram renderers.
//!
//! Every renderer is a pure function of the [`Schema`]: it cannot fail, and
//! rendering the same schema twice yields identical text.

pub mod graphviz;
pub mod mermaid;
pub mod plantuml;
mod types;

pub use types::DisplayType;

use crate::config::OutputFormat;
use crate::schema::Schema;

/// Render a schema in the requested notation.
pub fn render(schema: &Schema, format: OutputFormat) -> String {
    match format {
        OutputFormat::Mermaid => mermaid::render(schema),
        OutputFormat::PlantUml => plantuml::render(schema),
        OutputFormat::Graphviz => graphviz::render(schema),
    }
}
