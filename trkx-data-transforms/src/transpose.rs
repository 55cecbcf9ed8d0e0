//! Axis permutation

use ndarray::IxDyn;
use trkx_data_core::{Error, FieldArray, Parameters, Processor, Result};

/// Permutes array axes according to the `axes` parameter
///
/// `axes: [1, 0]` transposes a matrix; in general output axis `i` is input
/// axis `axes[i]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transpose;

impl Transpose {
    /// Registry id
    pub const ID: &'static str = "transpose";
}

impl Processor for Transpose {
    fn process(&self, data: FieldArray, params: &Parameters) -> Result<FieldArray> {
        let axes = params
            .get_usize_list(Self::ID, "axes")?
            .ok_or_else(|| Error::MissingParameter {
                processor: Self::ID.to_string(),
                parameter: "axes".to_string(),
            })?;

        let rank = data.ndim();
        let mut seen = vec![false; rank];
        let is_permutation = axes.len() == rank
            && axes.iter().all(|&axis| {
                axis < rank && !std::mem::replace(&mut seen[axis], true)
            });
        if !is_permutation {
            return Err(Error::AxesMismatch { axes, rank });
        }

        Ok(data
            .permuted_axes(IxDyn(&axes))
            .as_standard_layout()
            .into_owned())
    }
}
