// Conversion pipeline
//
// parse -> register -> resolve -> build. One Converter call owns all lookup
// state; nothing survives between conversions.

use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::graph::{DiagramGraph, GraphBuilder, GraphStats};
use crate::parser::{Document, EcoreParser};
use crate::resolve::Resolver;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of converting one metamodel
#[derive(Debug)]
pub struct ConversionResult {
    pub graph: DiagramGraph,
    /// Name of the converted package
    pub package: String,
    /// Non-fatal problems (unloadable foreign metamodels, ignored packages)
    pub warnings: Vec<String>,
    /// Documents read, input included
    pub documents: usize,
}

impl ConversionResult {
    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }
}

/// Converts metamodel documents into diagram graphs
pub struct Converter {
    config: Config,
    parser: EcoreParser,
}

impl Converter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parser: EcoreParser::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and convert a metamodel file
    pub fn convert_file(&self, input: &Path) -> Result<ConversionResult> {
        if !input.exists() {
            return Err(Error::PathNotFound(input.to_path_buf()));
        }
        info!(input = %input.display(), "Converting metamodel");
        let document = self.parser.parse_file(input)?;
        self.convert_document(document)
    }

    /// Convert an already parsed document
    pub fn convert_document(&self, document: Document) -> Result<ConversionResult> {
        let package = document
            .primary_package()
            .map(|p| p.name.clone())
            .ok_or_else(|| Error::parse(&document.path, "document contains no EPackage"))?;

        let mut warnings = Vec::new();
        if document.packages.len() > 1 {
            let ignored: Vec<&str> = document.packages[1..]
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            let message = format!(
                "Only package '{}' is converted; ignoring {}",
                package,
                ignored.join(", ")
            );
            warn!(path = %document.path.display(), ignored = ignored.len(), "Ignoring extra top-level packages");
            warnings.push(message);
        }

        let resolver = Resolver::new(
            &self.config.conversion,
            &self.config.schema_location,
            document,
        );
        let output = GraphBuilder::new(resolver).build()?;
        warnings.extend(output.warnings);

        Ok(ConversionResult {
            graph: output.graph,
            package,
            warnings,
            documents: output.documents,
        })
    }
}

/// Output path next to the input with the format's extension
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}
