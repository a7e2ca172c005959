//! CLI module for ecore-graph

mod args;

pub use args::{Args, Command};

use crate::config::{Catalog, Config, DEFAULT_CONFIG_FILE};
use crate::convert::{default_output_path, Converter};
use crate::error::{Error, Result};
use crate::logging::init_logging;
use crate::output::write_output;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Convert {
            input,
            output,
            materialize_external,
            hide_multiplicity,
            catalog,
            strict,
            config,
            format,
            verbose,
        } => {
            // An explicit config file must exist; the default one is optional
            let (mut cfg, ignored) = match &config {
                Some(config_path) => (Config::load(config_path)?, None),
                None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
            };

            let catalog = catalog.as_deref().map(Catalog::load).transpose()?;
            cfg.merge_cli(
                output,
                format,
                materialize_external,
                hide_multiplicity,
                strict,
                catalog,
            );
            cfg.validate()?;

            let level = if verbose {
                Some("info")
            } else {
                cfg.logging.level.as_deref()
            };
            if let Err(e) = init_logging(level, Some(cfg.logging.format.as_str())) {
                eprintln!("Warning: {}", e);
            }
            if let Some(e) = ignored {
                warn!(path = DEFAULT_CONFIG_FILE, error = %e, "Ignoring malformed config file");
            }

            if !input.exists() {
                return Err(Error::PathNotFound(input));
            }

            let converter = Converter::new(cfg);
            let format = converter.config().output.format;
            let output_path = converter
                .config()
                .output
                .path
                .clone()
                .unwrap_or_else(|| default_output_path(&input, format));

            let result = converter.convert_file(&input)?;

            write_output(&result.graph, format, &output_path)?;

            let stats = result.stats();
            info!(
                package = %result.package,
                nodes = stats.nodes,
                edges = stats.edges(),
                documents = result.documents,
                warnings = result.warnings.len(),
                "Conversion complete"
            );
            println!("Conversion finished: {}", output_path.display());
            Ok(())
        }
        Command::Version => {
            println!("ecore-graph {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
