//! Event file parsers for event data reading
//!
//! A parser loads one file into an [`EventFile`] handle; fields are then
//! extracted from it by tag and threaded through processing steps by the
//! [`extraction`] functions.

#![warn(missing_docs)]

mod error;
mod parser;
mod registry;

pub mod csv;
pub mod extraction;
pub mod npz;

#[cfg(feature = "pyg")]
pub mod graph;

#[cfg(feature = "tensorboard")]
pub mod scalar_log;

pub use error::{Error, Result};
pub use extraction::{extract_field, extract_fields, FieldSpec};
pub use parser::{EventFile, EventFileParser};
pub use registry::{ParserEntry, ParserRegistry};

pub use self::csv::CsvParser;
pub use npz::NpzParser;

#[cfg(feature = "pyg")]
pub use graph::GraphParser;

#[cfg(feature = "tensorboard")]
pub use scalar_log::ScalarLogParser;
