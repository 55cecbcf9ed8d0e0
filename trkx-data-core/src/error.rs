//! Error types for event data arrays, frames and processors

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A processor was invoked without a parameter it requires
    #[error("Processor '{processor}' requires parameter '{parameter}'")]
    MissingParameter {
        /// Processor id
        processor: String,
        /// Parameter name
        parameter: String,
    },

    /// A processor parameter has the wrong type or value
    #[error("Invalid parameter '{parameter}' for processor '{processor}': {reason}")]
    InvalidParameter {
        /// Processor id
        processor: String,
        /// Parameter name
        parameter: String,
        /// What is wrong with it
        reason: String,
    },

    /// Axis order does not describe the array's rank
    #[error("Axes {axes:?} do not permute an array of rank {rank}")]
    AxesMismatch {
        /// Requested axis order
        axes: Vec<usize>,
        /// Rank of the input array
        rank: usize,
    },

    /// Array rank is too low for the requested operation
    #[error("Operation '{operation}' needs an array of rank >= {expected}, got rank {actual}")]
    RankMismatch {
        /// Operation name
        operation: String,
        /// Minimum rank
        expected: usize,
        /// Actual rank
        actual: usize,
    },

    /// Index out of bounds along an axis
    #[error("Index {index} out of bounds for axis {axis} with length {len}")]
    IndexOutOfBounds {
        /// Requested (signed) index
        index: i64,
        /// Axis being indexed
        axis: usize,
        /// Length of that axis
        len: usize,
    },

    /// Min-max normalization over an array whose values are all equal
    #[error("Cannot normalize: degenerate value range (min == max == {value})")]
    DegenerateRange {
        /// The single value found in the array
        value: f64,
    },

    /// Normalization of an array without elements
    #[error("Cannot normalize an empty array")]
    EmptyArray,

    /// A frame column is not one-dimensional
    #[error("Column '{column}' must be one-dimensional, got shape {shape:?}")]
    ColumnShape {
        /// Column name
        column: String,
        /// Shape of the offending array
        shape: Vec<usize>,
    },

    /// Columns of one frame contribution differ in length
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// Column name
        column: String,
        /// Rows of the first column
        expected: usize,
        /// Rows of this column
        actual: usize,
    },

    /// Processor id not present in the registry
    #[error("Processor not registered: {0}")]
    ProcessorNotFound(String),

    /// Metadata key not present in a data container
    #[error("Metadata not found: {0}")]
    MetadataNotFound(String),

    /// Frame name not present in a data container
    #[error("Frame not found: {0}")]
    FrameNotFound(String),

    /// Column name not present in a frame
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Failure inside a processor
    #[error("Processing error: {0}")]
    Processing(String),
}
