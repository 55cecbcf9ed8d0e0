//! Error types for event file parsers

use std::path::PathBuf;

use thiserror::Error;

/// Error type for event file parsers
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] trkx_data_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV format error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Protobuf decoding error
    #[cfg(feature = "tensorboard")]
    #[error("Protobuf error: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// Error raised by the embedded Python interpreter
    #[cfg(feature = "pyg")]
    #[error("Python error: {0}")]
    Python(String),

    /// Malformed file contents
    #[error("Format error in {path}: {message}")]
    Format {
        /// File being parsed
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Requested tag is not present in a loaded file
    #[error("Field '{tag}' not found in {path} (available: {available})")]
    FieldNotFound {
        /// Requested tag
        tag: String,
        /// File the tag was looked up in
        path: PathBuf,
        /// Comma-separated list of tags the file does have
        available: String,
    },

    /// Parser relies on a capability missing from this build or runtime
    #[error("Parser '{parser}' is unavailable: {capability} is not installed")]
    CapabilityUnavailable {
        /// Parser id
        parser: String,
        /// Missing capability
        capability: String,
    },

    /// Parser id not present in the registry
    #[error("Parser not registered: {0}")]
    ParserNotFound(String),
}

/// Result type for event file parsers
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a [`Error::Format`] for `path`
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            message: message.into(),
        }
    }
}
