//! Named one-dimensional columns of a frame

use crate::array::FieldArray;
use crate::error::{Error, Result};

/// A named column of `f64` values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Name of the column
    name: String,

    /// Values in row order
    values: Vec<f64>,
}

impl Column {
    /// Create a new column with the given name and values
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a column from an extracted field
    ///
    /// The field must be one-dimensional; anything else has to be reduced by
    /// a processing step (usually `select`) before it can become a column.
    pub fn from_array(name: impl Into<String>, array: FieldArray) -> Result<Self> {
        let name = name.into();
        if array.ndim() != 1 {
            return Err(Error::ColumnShape {
                column: name,
                shape: array.shape().to_vec(),
            });
        }

        Ok(Self {
            name,
            values: array.iter().copied().collect(),
        })
    }

    /// Get the name of this column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the length of this column (number of values)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this column is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the column, returning its values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array;

    #[test]
    fn test_from_array_one_dimensional() {
        let column = Column::from_array("x", array::from_vec(vec![1.0, 2.0])).unwrap();
        assert_eq!(column.name(), "x");
        assert_eq!(column.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_from_array_rejects_matrix() {
        let matrix = array::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let result = Column::from_array("m", matrix);
        assert!(matches!(result, Err(Error::ColumnShape { ref shape, .. }) if shape == &[2, 2]));
    }

    #[test]
    fn test_into_values() {
        let column = Column::new("z", vec![1.0, f64::NAN]);
        assert_eq!(column.len(), 2);
        let values = column.into_values();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
    }
}
