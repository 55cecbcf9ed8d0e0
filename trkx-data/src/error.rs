//! Error types for the event data reader

use std::path::PathBuf;

use thiserror::Error;

/// Error type for the event data reader
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] trkx_data_core::Error),

    /// Parser or extraction error
    #[error("Reader error: {0}")]
    Readers(#[from] trkx_data_readers::Error),

    /// Configuration file could not be read
    #[error("Cannot open configuration file {path}: {source}")]
    Io {
        /// Configuration path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML
    #[error("Cannot parse {path} as YAML: {source}")]
    Yaml {
        /// Configuration path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration at '{key}': {message}")]
    Config {
        /// Dotted path of the offending key
        key: String,
        /// What is wrong with it
        message: String,
    },

    /// A file of the requested event does not exist
    #[error("Event file not found: {0}")]
    MissingFile(PathBuf),

    /// A path template names a variable with no binding
    #[error("Template '{template}' references unbound variable '{name}'")]
    UnresolvedPlaceholder {
        /// Template source
        template: String,
        /// Placeholder name
        name: String,
    },

    /// Malformed path template or a value it cannot format
    #[error("Template '{template}': {message}")]
    Template {
        /// Template source
        template: String,
        /// What went wrong
        message: String,
    },
}

/// Result type for the event data reader
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an [`Error::Config`]
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub(crate) fn template(template: &str, message: impl Into<String>) -> Self {
        Error::Template {
            template: template.to_string(),
            message: message.into(),
        }
    }
}
