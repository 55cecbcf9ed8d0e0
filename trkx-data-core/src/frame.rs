//! Tabular frames assembled from extracted fields

use std::fmt;

use crate::array::FieldArray;
use crate::column::Column;
use crate::error::{Error, Result};

/// Number of rows shown by [`Frame::head`] when summarising a frame
pub const HEAD_ROWS: usize = 5;

/// A collection of equal-length named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Columns in insertion order
    columns: Vec<Column>,

    /// Number of rows in this frame
    row_count: usize,
}

impl Frame {
    /// Create a new frame from columns
    ///
    /// All columns must have the same length and distinct names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);

        for (i, column) in columns.iter().enumerate() {
            if column.len() != row_count {
                return Err(Error::LengthMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(Error::InvalidArgument(format!(
                    "Duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Create a frame from named field arrays
    pub fn from_fields<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FieldArray)>,
        S: Into<String>,
    {
        let columns = fields
            .into_iter()
            .map(|(name, array)| Column::from_array(name, array))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Concatenate frames along the row axis
    ///
    /// Columns are matched by name. The output keeps columns in the order they
    /// are first seen; rows from a frame lacking a column are filled with `NaN`.
    pub fn concat(frames: &[Frame]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        for frame in frames {
            for column in &frame.columns {
                if !names.contains(&column.name()) {
                    names.push(column.name());
                }
            }
        }

        let row_count = frames.iter().map(Frame::row_count).sum();
        let columns = names
            .iter()
            .map(|&name| {
                let mut values = Vec::with_capacity(row_count);
                for frame in frames {
                    match frame.column_by_name(name) {
                        Ok(column) => values.extend_from_slice(column.values()),
                        Err(_) => values.resize(values.len() + frame.row_count, f64::NAN),
                    }
                }
                Column::new(name, values)
            })
            .collect();

        Self { columns, row_count }
    }

    /// Get the number of rows in this frame
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Get the number of columns in this frame
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if this frame has no rows
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Get a reference to a column by name
    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Names of all columns in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Copy the first `n` rows (or fewer, if the frame is shorter)
    pub fn head(&self, n: usize) -> Self {
        let rows = n.min(self.row_count);
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.values()[..rows].to_vec()))
                .collect(),
            row_count: rows,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const MAX_ROWS: usize = 10;
        const MAX_COLS: usize = 8;

        writeln!(f, "Frame: {} rows, {} columns", self.row_count, self.columns.len())?;

        let display_cols = self.columns.len().min(MAX_COLS);

        write!(f, "{:>6}", "")?;
        for column in &self.columns[..display_cols] {
            write!(f, " {:>12}", column.name())?;
        }
        if display_cols < self.columns.len() {
            write!(f, " ... ({} more columns)", self.columns.len() - display_cols)?;
        }
        writeln!(f)?;

        let display_rows = self.row_count.min(MAX_ROWS);
        for row in 0..display_rows {
            write!(f, "{row:>6}")?;
            for column in &self.columns[..display_cols] {
                write!(f, " {:>12}", column.values()[row])?;
            }
            writeln!(f)?;
        }

        if self.row_count > MAX_ROWS {
            writeln!(f, "... ({} more rows)", self.row_count - MAX_ROWS)?;
        }

        Ok(())
    }
}
