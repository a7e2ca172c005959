// Output generation module

pub mod graphml;

pub use graphml::GraphmlWriter;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::graph::DiagramGraph;
use std::path::Path;

/// Render a graph in the requested format
pub fn render(graph: &DiagramGraph, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Graphml => GraphmlWriter::new().write(graph),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&graph.snapshot())?),
    }
}

/// Render a graph and write it to `path`
pub fn write_output(graph: &DiagramGraph, format: OutputFormat, path: &Path) -> Result<()> {
    let content = render(graph, format)?;
    std::fs::write(path, content)?;
    Ok(())
}
