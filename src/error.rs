use std::path::PathBuf;
use thiserror::Error;

/// Conversion error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Cannot resolve '{reference}' for {owner}: {message}")]
    Resolution {
        reference: String,
        owner: String,
        message: String,
    },

    #[error("Cannot load metamodel '{locator}' from {path} (referenced by '{reference}' for {owner}): {message}")]
    ExternalLoad {
        locator: String,
        path: PathBuf,
        reference: String,
        owner: String,
        message: String,
    },

    #[error("Output error: {0}")]
    Output(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a resolution error for a raw reference owned by `owner`
    pub fn resolution(
        reference: impl Into<String>,
        owner: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Resolution {
            reference: reference.into(),
            owner: owner.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(msg: impl Into<String>) -> Self {
        Error::Output(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = Error::PathNotFound(PathBuf::from("/some/model.ecore"));
        assert_eq!(err.to_string(), "Path not found: /some/model.ecore");
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("/models/library.ecore", "EClass without name");
        assert!(err.to_string().contains("/models/library.ecore"));
        assert!(err.to_string().contains("EClass without name"));
    }

    #[test]
    fn test_resolution_error_carries_reference_and_owner() {
        let err = Error::resolution("#//Missing", "Library.books", "no classifier matches");
        let msg = err.to_string();
        assert!(msg.contains("#//Missing"));
        assert!(msg.contains("Library.books"));
        assert!(msg.contains("no classifier matches"));
    }

    #[test]
    fn test_external_load_display() {
        let err = Error::ExternalLoad {
            locator: "contacts.ecore".to_string(),
            path: PathBuf::from("/models/contacts.ecore"),
            reference: "contacts.ecore#//Address".to_string(),
            owner: "Person.address".to_string(),
            message: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("contacts.ecore#//Address"));
        assert!(msg.contains("Person.address"));
        assert!(msg.contains("/models/contacts.ecore"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("unknown log format");
        assert_eq!(err.to_string(), "Config validation error: unknown log format");
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
