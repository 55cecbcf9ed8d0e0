//! Sub-array selection by column, row or key

use ndarray::Axis;
use tracing::trace;
use trkx_data_core::array::{require_rank, resolve_index};
use trkx_data_core::{FieldArray, Indices, Parameters, Processor, Result};

/// Selects a sub-array
///
/// The first parameter present, in the order `column`, `row`, `key`, decides
/// what is selected:
///
/// - `column` picks positions along axis 1 (`data[:, c]`), rank >= 2
/// - `row` picks positions along axis 0 of a rank >= 2 array (`data[r, :]`)
/// - `key` picks positions along axis 0 of any array (`data[k]`)
///
/// Each accepts an integer, which drops the indexed axis, or a list of
/// integers, which keeps it. Negative positions count from the end.
/// Without any of the three parameters the input is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Select;

impl Select {
    /// Registry id
    pub const ID: &'static str = "select";
}

impl Processor for Select {
    fn process(&self, data: FieldArray, params: &Parameters) -> Result<FieldArray> {
        if let Some(indices) = params.get_indices(Self::ID, "column")? {
            require_rank(&data, "select column", 2)?;
            return select_along(&data, 1, &indices);
        }
        if let Some(indices) = params.get_indices(Self::ID, "row")? {
            require_rank(&data, "select row", 2)?;
            return select_along(&data, 0, &indices);
        }
        if let Some(indices) = params.get_indices(Self::ID, "key")? {
            require_rank(&data, "select key", 1)?;
            return select_along(&data, 0, &indices);
        }

        trace!("select without column, row or key; passing through");
        Ok(data)
    }
}

fn select_along(data: &FieldArray, axis: usize, indices: &Indices) -> Result<FieldArray> {
    match indices {
        Indices::Single(index) => {
            let index = resolve_index(data, axis, *index)?;
            Ok(data.index_axis(Axis(axis), index).to_owned())
        }
        Indices::List(list) => {
            let resolved = list
                .iter()
                .map(|&index| resolve_index(data, axis, index))
                .collect::<Result<Vec<_>>>()?;
            Ok(data.select(Axis(axis), &resolved))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use trkx_data_core::{array, Error};

    fn matrix() -> FieldArray {
        // [[1, 2, 3],
        //  [4, 5, 6]]
        array::from_shape_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    fn values(array: &FieldArray) -> Vec<f64> {
        array.iter().copied().collect()
    }

    #[test_case("column", 1, &[2.0, 5.0] ; "column")]
    #[test_case("column", -1, &[3.0, 6.0] ; "negative column")]
    #[test_case("row", 1, &[4.0, 5.0, 6.0] ; "row")]
    #[test_case("key", 0, &[1.0, 2.0, 3.0] ; "key")]
    fn test_select_single(parameter: &str, index: i64, expected: &[f64]) {
        let params = Parameters::new().with(parameter, index);
        let result = Select.process(matrix(), &params).unwrap();
        assert_eq!(result.ndim(), 1);
        assert_eq!(values(&result), expected);
    }

    #[test]
    fn test_select_list_keeps_axis() {
        let params = Parameters::new().with("column", vec![0_i64, 2]);
        let result = Select.process(matrix(), &params).unwrap();
        assert_eq!(result.shape(), &[2, 2]);
        assert_eq!(values(&result), vec![1.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_column_takes_precedence() {
        let params = Parameters::new().with("row", 0_i64).with("column", 0_i64);
        let result = Select.process(matrix(), &params).unwrap();
        assert_eq!(values(&result), vec![1.0, 4.0]);
    }

    #[test]
    fn test_row_takes_precedence_over_key() {
        let params = Parameters::new().with("key", 0_i64).with("row", 1_i64);
        let result = Select.process(matrix(), &params).unwrap();
        assert_eq!(values(&result), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_no_parameters_is_identity() {
        let data = matrix();
        let result = Select.process(data.clone(), &Parameters::new()).unwrap();
        assert_eq!(result, data);

        let unrelated = Parameters::new().with("scale", 2.0);
        assert_eq!(Select.process(data.clone(), &unrelated).unwrap(), data);
    }

    #[test]
    fn test_key_on_vector() {
        let data = array::from_vec(vec![7.0, 8.0, 9.0]);
        let result = Select.process(data, &Parameters::new().with("key", 2_i64)).unwrap();
        assert_eq!(result.ndim(), 0);
        assert_eq!(values(&result), vec![9.0]);
    }

    #[test]
    fn test_row_on_vector_is_rank_error() {
        let data = array::from_vec(vec![7.0, 8.0]);
        let result = Select.process(data, &Parameters::new().with("row", 0_i64));
        assert!(matches!(result, Err(Error::RankMismatch { .. })));
    }

    #[test]
    fn test_out_of_bounds() {
        let result = Select.process(matrix(), &Parameters::new().with("column", 3_i64));
        assert!(matches!(
            result,
            Err(Error::IndexOutOfBounds { index: 3, axis: 1, len: 3 })
        ));
    }
}
