//! Cell parsing for tabular text files

use std::path::Path;

use trkx_data_core::Column;

use crate::error::{Error, Result};

/// Parse a single cell into a numeric value
///
/// Empty cells are missing values and become `NaN`. Boolean literals map to
/// `1` and `0`. Anything else must parse as a number.
pub fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(f64::NAN);
    }

    match cell {
        "true" | "True" | "TRUE" => Some(1.0),
        "false" | "False" | "FALSE" => Some(0.0),
        _ => cell.parse::<f64>().ok(),
    }
}

/// Parse column `col_idx` of every record into a numeric column
pub fn parse_column(
    path: &Path,
    records: &[csv::StringRecord],
    col_idx: usize,
    name: &str,
) -> Result<Column> {
    let mut values = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let cell = record.get(col_idx).unwrap_or("");
        let value = parse_cell(cell).ok_or_else(|| {
            Error::format(
                path,
                format!("column '{name}' row {row}: cannot parse '{cell}' as a number"),
            )
        })?;
        values.push(value);
    }

    Ok(Column::new(name, values))
}
