//! Core types for configuration-driven event data reading
//!
//! This crate provides the pieces every other crate in the workspace builds
//! upon: the field array type, columns and frames, the [`Data`] output
//! container, and the [`Processor`] abstraction used by processing pipelines.

#![warn(missing_docs)]

pub mod array;
pub mod column;
pub mod data;
pub mod error;
pub mod frame;
pub mod processor;
pub mod value;

// Re-export key types for convenience
pub use array::FieldArray;
pub use column::Column;
pub use data::Data;
pub use error::{Error, Result};
pub use frame::Frame;
pub use processor::{Indices, Parameters, ProcessingStep, Processor, ProcessorRegistry};
pub use value::Value;
