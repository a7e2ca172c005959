use crate::error::{Error, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ecore-graph.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    /// Metamodel locator to local file mapping
    #[serde(alias = "Schema Location")]
    pub schema_location: Catalog,
}

/// Conversion settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Create nodes for classes defined in other metamodels
    pub materialize_external: bool,
    /// Leave bounds off attribute lines
    pub hide_multiplicity: bool,
    /// Abort when a referenced metamodel cannot be loaded
    pub strict_foreign_load: bool,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: String,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Graphml,
    Json,
}

impl OutputFormat {
    /// File extension used for default output paths
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Graphml => "graphml",
            OutputFormat::Json => "json",
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
        }
    }
}

/// Mapping from a foreign metamodel locator (usually an nsURI) to a file path.
///
/// Paths are resolved relative to the directory of the input metamodel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    #[serde(alias = "Schema Location")]
    schema_location: Catalog,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `schema_location` table of a TOML catalog file.
    ///
    /// Keys must be quoted since URIs are not bare TOML keys:
    /// `"http://example.org/contacts" = "shared/contacts.ecore"`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&contents)?;
        Ok(file.schema_location)
    }

    pub fn insert(&mut self, locator: impl Into<String>, path: impl Into<String>) {
        self.entries.insert(locator.into(), path.into());
    }

    /// Look up the file registered for a locator
    pub fn lookup(&self, locator: &str) -> Option<&str> {
        self.entries.get(locator).map(String::as_str)
    }

    /// Add all entries of `other`, replacing existing locators
    pub fn extend(&mut self, other: Catalog) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional config file.
    ///
    /// A missing file gives defaults. A file that exists but cannot be read
    /// also gives defaults, together with the error so the caller can report it.
    pub fn load_or_default(path: &Path) -> (Self, Option<Error>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence).
    ///
    /// Boolean flags can only switch options on.
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        format: Option<String>,
        materialize_external: bool,
        hide_multiplicity: bool,
        strict: bool,
        catalog: Option<Catalog>,
    ) {
        if let Some(out) = output {
            self.output.path = Some(out);
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Graphml,
            };
        }

        if materialize_external {
            self.conversion.materialize_external = true;
        }

        if hide_multiplicity {
            self.conversion.hide_multiplicity = true;
        }

        if strict {
            self.conversion.strict_foreign_load = true;
        }

        if let Some(catalog) = catalog {
            self.schema_location.extend(catalog);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if LogFormat::from_str(&self.logging.format).is_err() {
            return Err(Error::config_validation(format!(
                "unknown log format '{}' (expected one of {})",
                self.logging.format,
                LogFormat::variants().join(", ")
            )));
        }

        for (locator, path) in self.schema_location.iter() {
            if locator.trim().is_empty() {
                return Err(Error::config_validation("catalog locator cannot be empty"));
            }
            if path.trim().is_empty() {
                return Err(Error::config_validation(format!(
                    "catalog entry '{}' has an empty path",
                    locator
                )));
            }
        }

        Ok(())
    }
}
