//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Convert Ecore metamodels to yEd diagrams
#[derive(Parser, Debug)]
#[command(name = "ecore-graph")]
#[command(about = "Convert Ecore metamodels to yEd (GraphML) diagrams")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a metamodel into a diagram
    Convert {
        /// Metamodel file (*.ecore)
        input: PathBuf,

        /// Output file; defaults to the input path with a .graphml extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Create nodes for classes defined in other metamodels
        #[arg(short = 'e', long)]
        materialize_external: bool,

        /// Leave multiplicities off attribute lines
        #[arg(short = 'a', long)]
        hide_multiplicity: bool,

        /// TOML file mapping metamodel URIs to local files
        ///
        /// Entries go in a `[schema_location]` table, one `"uri" = "path"`
        /// pair per line. Paths are relative to the input file's directory.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Fail when a referenced metamodel cannot be loaded
        #[arg(long)]
        strict: bool,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (graphml, json)
        #[arg(long, value_parser = ["graphml", "json"])]
        format: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}
