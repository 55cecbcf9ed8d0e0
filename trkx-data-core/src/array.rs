//! Field arrays extracted from event files

use ndarray::{Array1, ArrayD, Axis, IxDyn};

use crate::error::{Error, Result};

/// An extracted field: an `f64` array of arbitrary rank
pub type FieldArray = ArrayD<f64>;

/// Create a field array from a flat vector in row-major order
pub fn from_shape_vec(shape: &[usize], values: Vec<f64>) -> Result<FieldArray> {
    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(Error::InvalidArgument(format!(
            "{} values do not fill shape {:?} ({} elements)",
            values.len(),
            shape,
            expected
        )));
    }

    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|e| Error::InvalidArgument(e.to_string()))
}

/// Create a one-dimensional field array
pub fn from_vec(values: Vec<f64>) -> FieldArray {
    Array1::from(values).into_dyn()
}

/// Resolve a possibly negative index against the length of `axis`
///
/// Negative indices count from the end, so `-1` is the last element.
pub fn resolve_index(array: &FieldArray, axis: usize, index: i64) -> Result<usize> {
    let len = array.len_of(Axis(axis));
    let resolved = if index < 0 {
        i64::try_from(len).ok().map(|len| len + index)
    } else {
        Some(index)
    };

    match resolved.and_then(|i| usize::try_from(i).ok()) {
        Some(i) if i < len => Ok(i),
        _ => Err(Error::IndexOutOfBounds { index, axis, len }),
    }
}

/// Check that `array` has at least `rank` dimensions
pub fn require_rank(array: &FieldArray, operation: &str, rank: usize) -> Result<()> {
    if array.ndim() < rank {
        return Err(Error::RankMismatch {
            operation: operation.to_string(),
            expected: rank,
            actual: array.ndim(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_shape_vec() {
        let array = from_shape_vec(&[2, 3], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array[IxDyn(&[1, 0])], 3.0);
    }

    #[test]
    fn test_from_shape_vec_size_mismatch() {
        let result = from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_resolve_negative_index() {
        let array = from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(resolve_index(&array, 0, -1).unwrap(), 2);
        assert_eq!(resolve_index(&array, 0, 0).unwrap(), 0);
        assert!(matches!(
            resolve_index(&array, 0, 3),
            Err(Error::IndexOutOfBounds { index: 3, axis: 0, len: 3 })
        ));
        assert!(resolve_index(&array, 0, -4).is_err());
    }

    #[test]
    fn test_require_rank() {
        let array = from_vec(vec![1.0]);
        assert!(require_rank(&array, "row", 1).is_ok());
        assert!(matches!(
            require_rank(&array, "row", 2),
            Err(Error::RankMismatch { expected: 2, actual: 1, .. })
        ));
    }
}
