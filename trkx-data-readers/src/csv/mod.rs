//! Tabular text event files
//!
//! Loading reads the header and raw records. Extraction parses one named
//! column into `f64` values and returns it as a 1-D array; rows shorter than
//! the header read as missing cells.

mod parser;
mod reader;

pub use parser::parse_cell;
pub use reader::{CsvFile, CsvOptions, CsvParser};
