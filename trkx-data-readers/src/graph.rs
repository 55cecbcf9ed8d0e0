//! Serialized PyTorch Geometric graph objects
//!
//! Files are loaded through an embedded Python interpreter with
//! `torch.load(path, map_location="cpu")`. Each tag names an attribute of the
//! loaded object, converted with `.numpy()`.

use std::path::{Path, PathBuf};

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use tracing::debug;
use trkx_data_core::{array, FieldArray};

use crate::error::{Error, Result};
use crate::parser::{EventFile, EventFileParser};

/// Capability the parser depends on
pub const CAPABILITY: &str = "PyTorch Geometric";

/// Parser for pickled graph objects, registered as `pyg.pickle`
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphParser;

impl GraphParser {
    /// Registry id
    pub const ID: &'static str = "pyg.pickle";
}

fn python_error(err: PyErr) -> Error {
    Error::Python(err.to_string())
}

fn unavailable() -> Error {
    Error::CapabilityUnavailable {
        parser: GraphParser::ID.to_string(),
        capability: CAPABILITY.to_string(),
    }
}

impl EventFileParser for GraphParser {
    fn load(&self, path: &Path) -> Result<Box<dyn EventFile>> {
        let object = Python::with_gil(|py| -> Result<PyObject> {
            let torch = PyModule::import(py, "torch").map_err(|_| unavailable())?;
            PyModule::import(py, "torch_geometric").map_err(|_| unavailable())?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("map_location", "cpu").map_err(python_error)?;
            let loaded = torch
                .getattr("load")
                .and_then(|load| load.call((path.to_string_lossy().as_ref(),), Some(kwargs)))
                .map_err(python_error)?;
            Ok(loaded.into())
        })?;

        debug!(path = %path.display(), "loaded graph object");
        Ok(Box::new(GraphFile {
            path: path.to_path_buf(),
            object,
        }))
    }
}

/// A graph object held by the interpreter
pub struct GraphFile {
    path: PathBuf,
    object: PyObject,
}

impl EventFile for GraphFile {
    fn extract(&self, tag: &str) -> Result<FieldArray> {
        Python::with_gil(|py| {
            let object = self.object.as_ref(py);
            let attribute = object.getattr(tag).map_err(|_| Error::FieldNotFound {
                tag: tag.to_string(),
                path: self.path.clone(),
                available: self.tags().join(", "),
            })?;

            let numpy = attribute
                .call_method0("detach")
                .and_then(|t| t.call_method0("cpu"))
                .and_then(|t| t.call_method0("numpy"))
                .map_err(python_error)?;
            let shape: Vec<usize> = numpy
                .getattr("shape")
                .and_then(|shape| shape.extract())
                .map_err(python_error)?;
            let values: Vec<f64> = numpy
                .call_method1("astype", ("float64",))
                .and_then(|a| a.call_method0("ravel"))
                .and_then(|a| a.call_method0("tolist"))
                .and_then(|list| list.extract())
                .map_err(python_error)?;

            Ok(array::from_shape_vec(&shape, values)?)
        })
    }

    fn tags(&self) -> Vec<String> {
        Python::with_gil(|py| {
            let object = self.object.as_ref(py);
            let keys = match object.getattr("keys") {
                Ok(keys) if keys.is_callable() => keys.call0(),
                other => other,
            };
            keys.and_then(|keys| keys.extract::<Vec<String>>())
                .unwrap_or_default()
        })
    }
}
