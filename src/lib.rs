//! ecore-graph - Convert Ecore metamodels to yEd diagrams
//!
//! Reads an Ecore metamodel, resolves its type references (including
//! references into other metamodel files) and writes an entity-relationship
//! diagram as yEd GraphML. Layout is left to yEd.

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod graph;
pub mod logging;
pub mod output;
pub mod parser;
pub mod resolve;

// Re-export main types
pub use config::{Catalog, Config, ConversionConfig, OutputFormat};
pub use convert::{default_output_path, ConversionResult, Converter};
pub use error::{Error, Result};
pub use graph::{DiagramGraph, GraphEdge, GraphNode, RelationKind};
pub use output::GraphmlWriter;
