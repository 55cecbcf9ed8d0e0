//! Scaling and min-max normalization

use trkx_data_core::{Error, FieldArray, Parameters, Processor, Result};

/// Normalizes array values
///
/// With a `scale` parameter every element is divided by it. Without one the
/// whole array is min-max normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl Normalize {
    /// Registry id
    pub const ID: &'static str = "normalize";
}

impl Processor for Normalize {
    #[allow(clippy::float_cmp)]
    fn process(&self, data: FieldArray, params: &Parameters) -> Result<FieldArray> {
        if let Some(scale) = params.get_f64(Self::ID, "scale")? {
            if scale == 0.0 {
                return Err(Error::InvalidParameter {
                    processor: Self::ID.to_string(),
                    parameter: "scale".to_string(),
                    reason: "scale must be non-zero".to_string(),
                });
            }
            return Ok(data / scale);
        }

        if data.is_empty() {
            return Err(Error::EmptyArray);
        }

        let minimum = data.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if minimum > maximum {
            return Err(Error::Processing(
                "cannot normalize an array without comparable values".to_string(),
            ));
        }
        if maximum == minimum {
            return Err(Error::DegenerateRange { value: minimum });
        }

        let range = maximum - minimum;
        Ok(data.mapv(|x| (x - minimum) / range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trkx_data_core::array;

    fn values(array: &FieldArray) -> Vec<f64> {
        array.iter().copied().collect()
    }

    #[test]
    fn test_explicit_scale() {
        let params = Parameters::new().with("scale", 2_i64);
        let result = Normalize
            .process(array::from_vec(vec![2.0, 4.0, 6.0]), &params)
            .unwrap();
        assert_eq!(values(&result), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_min_max() {
        let result = Normalize
            .process(array::from_vec(vec![1.0, 2.0, 3.0]), &Parameters::new())
            .unwrap();
        assert_eq!(values(&result), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_min_max_over_whole_matrix() {
        let data = array::from_shape_vec(&[2, 2], vec![0.0, 5.0, 10.0, 2.5]).unwrap();
        let result = Normalize.process(data, &Parameters::new()).unwrap();
        assert_eq!(result.shape(), &[2, 2]);
        assert_eq!(values(&result), vec![0.0, 0.5, 1.0, 0.25]);
    }

    #[test]
    fn test_constant_array_is_degenerate() {
        let result = Normalize.process(array::from_vec(vec![4.0, 4.0, 4.0]), &Parameters::new());
        assert!(matches!(result, Err(Error::DegenerateRange { value }) if value == 4.0));
    }

    #[test]
    fn test_single_element_is_degenerate() {
        let result = Normalize.process(array::from_vec(vec![1.0]), &Parameters::new());
        assert!(matches!(result, Err(Error::DegenerateRange { .. })));
    }

    #[test]
    fn test_empty_array() {
        let result = Normalize.process(array::from_vec(Vec::new()), &Parameters::new());
        assert!(matches!(result, Err(Error::EmptyArray)));
    }

    proptest::proptest! {
        #[test]
        fn test_min_max_bounds(values in proptest::collection::vec(-1.0e6_f64..1.0e6, 2..64)) {
            let data = array::from_vec(values);
            match Normalize.process(data, &Parameters::new()) {
                Ok(result) => {
                    proptest::prop_assert!(result.iter().all(|v| (0.0..=1.0).contains(v)));
                }
                Err(err) => {
                    let degenerate = matches!(err, Error::DegenerateRange { .. });
                    proptest::prop_assert!(degenerate, "unexpected error: {}", err);
                }
            }
        }
    }

    #[test]
    fn test_zero_scale() {
        let params = Parameters::new().with("scale", 0.0);
        let result = Normalize.process(array::from_vec(vec![1.0]), &params);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }
}
