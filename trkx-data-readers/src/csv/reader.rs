//! Tabular text parser

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;
use trkx_data_core::{array, FieldArray};

use crate::error::{Error, Result};
use crate::parser::{EventFile, EventFileParser};

use super::parser::parse_column;

/// Options for the tabular text parser
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Delimiter character
    pub delimiter: u8,

    /// Quote character
    pub quote: u8,

    /// Comment character
    pub comment: Option<u8>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            comment: None,
        }
    }
}

/// Parser for delimited text files with a header row, registered as `pandas.csv`
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    options: CsvOptions,
}

impl CsvParser {
    /// Registry id
    pub const ID: &'static str = "pandas.csv";

    /// Create a parser with the given options
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    fn builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .comment(self.options.comment)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All);
        builder
    }
}

impl EventFileParser for CsvParser {
    fn load(&self, path: &Path) -> Result<Box<dyn EventFile>> {
        let mut reader = self.builder().from_path(path)?;

        let header = reader.headers()?.clone();
        if header.is_empty() {
            return Err(Error::format(path, "missing header row"));
        }

        let mut seen = HashSet::new();
        for name in &header {
            if !seen.insert(name) {
                return Err(Error::format(path, format!("duplicate column '{name}'")));
            }
        }

        let records = reader.records().collect::<std::result::Result<Vec<StringRecord>, _>>()?;

        debug!(
            path = %path.display(),
            rows = records.len(),
            columns = header.len(),
            "loaded csv file"
        );
        Ok(Box::new(CsvFile {
            path: path.to_path_buf(),
            header,
            records,
        }))
    }
}

/// Raw records of a loaded tabular text file
///
/// Cells stay as text until a column is extracted, so columns that are never
/// requested may hold anything.
pub struct CsvFile {
    path: PathBuf,
    header: StringRecord,
    records: Vec<StringRecord>,
}

impl EventFile for CsvFile {
    fn extract(&self, tag: &str) -> Result<FieldArray> {
        let idx = self
            .header
            .iter()
            .position(|name| name == tag)
            .ok_or_else(|| Error::FieldNotFound {
                tag: tag.to_string(),
                path: self.path.clone(),
                available: self.tags().join(", "),
            })?;

        let column = parse_column(&self.path, &self.records, idx, tag)?;
        Ok(array::from_vec(column.into_values()))
    }

    fn tags(&self) -> Vec<String> {
        self.header.iter().map(str::to_string).collect()
    }
}
