//! NumPy `.npz` archive parser
//!
//! Every array of the archive is decoded when the file is loaded and widened
//! to `f64`. Fortran-ordered arrays keep their logical shape. Tags are listed
//! in name order.

use std::io::Read;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use npyz::npz::NpzArchive;
use npyz::{DType, NpyFile, Order};
use tracing::debug;
use trkx_data_core::FieldArray;

use crate::error::{Error, Result};
use crate::parser::{EventFile, EventFileParser};

/// Parser for NumPy `.npz` archives, registered as `numpy.npz`
#[derive(Debug, Clone, Copy, Default)]
pub struct NpzParser;

impl NpzParser {
    /// Registry id
    pub const ID: &'static str = "numpy.npz";
}

impl EventFileParser for NpzParser {
    fn load(&self, path: &Path) -> Result<Box<dyn EventFile>> {
        let mut archive = NpzArchive::open(path)?;
        let mut names: Vec<String> = archive.array_names().map(str::to_string).collect();
        names.sort_unstable();

        let mut arrays = IndexMap::with_capacity(names.len());
        for name in names {
            let npy = archive
                .by_name(&name)?
                .ok_or_else(|| Error::format(path, format!("array '{name}' listed but missing")))?;
            let array = decode_npy(npy).map_err(|message| {
                Error::format(path, format!("array '{name}': {message}"))
            })?;
            arrays.insert(name, array);
        }

        debug!(path = %path.display(), arrays = arrays.len(), "loaded npz archive");
        Ok(Box::new(NpzFile {
            path: path.to_path_buf(),
            arrays,
        }))
    }
}

/// Arrays of a loaded `.npz` archive
pub struct NpzFile {
    path: PathBuf,
    arrays: IndexMap<String, FieldArray>,
}

impl EventFile for NpzFile {
    fn extract(&self, tag: &str) -> Result<FieldArray> {
        self.arrays.get(tag).cloned().ok_or_else(|| Error::FieldNotFound {
            tag: tag.to_string(),
            path: self.path.clone(),
            available: self.tags().join(", "),
        })
    }

    fn tags(&self) -> Vec<String> {
        self.arrays.keys().cloned().collect()
    }
}

/// Decode one `.npy` member into an `f64` array
#[allow(clippy::cast_precision_loss)]
fn decode_npy<R: Read>(npy: NpyFile<R>) -> std::result::Result<FieldArray, String> {
    let shape: Vec<usize> = npy
        .shape()
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| format!("dimension {d} too large")))
        .collect::<std::result::Result<_, _>>()?;
    let fortran = matches!(npy.order(), Order::Fortran);

    let DType::Plain(type_str) = npy.dtype() else {
        return Err("structured and sub-array dtypes are not supported".to_string());
    };
    let descr = type_str.to_string();
    let kind = descr.trim_start_matches(['<', '>', '|', '=']);

    let io = |e: std::io::Error| e.to_string();
    let values: Vec<f64> = match kind {
        "f8" => npy.into_vec::<f64>().map_err(io)?,
        "f4" => widen(npy.into_vec::<f32>().map_err(io)?, f64::from),
        "i8" => widen(npy.into_vec::<i64>().map_err(io)?, |v| v as f64),
        "i4" => widen(npy.into_vec::<i32>().map_err(io)?, f64::from),
        "i2" => widen(npy.into_vec::<i16>().map_err(io)?, f64::from),
        "i1" => widen(npy.into_vec::<i8>().map_err(io)?, f64::from),
        "u8" => widen(npy.into_vec::<u64>().map_err(io)?, |v| v as f64),
        "u4" => widen(npy.into_vec::<u32>().map_err(io)?, f64::from),
        "u2" => widen(npy.into_vec::<u16>().map_err(io)?, f64::from),
        "u1" => widen(npy.into_vec::<u8>().map_err(io)?, f64::from),
        "b1" => widen(npy.into_vec::<bool>().map_err(io)?, |v| if v { 1.0 } else { 0.0 }),
        other => return Err(format!("unsupported dtype '{other}'")),
    };

    let array = if fortran {
        ArrayD::from_shape_vec(IxDyn(&shape).f(), values)
    } else {
        ArrayD::from_shape_vec(IxDyn(&shape), values)
    };
    array
        .map(|a| a.as_standard_layout().into_owned())
        .map_err(|e| e.to_string())
}

fn widen<T>(values: Vec<T>, convert: impl Fn(T) -> f64) -> Vec<f64> {
    values.into_iter().map(convert).collect()
}
