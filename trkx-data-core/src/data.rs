//! Output container for one read unit

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::frame::{Frame, HEAD_ROWS};
use crate::value::Value;

/// Data read for one combination of variable values
///
/// `metadata` holds the variable values this unit was read with, and
/// `dataframes` the frames assembled from its files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    metadata: IndexMap<String, Value>,
    dataframes: IndexMap<String, Frame>,
}

impl Data {
    /// Create a new container
    pub fn new(metadata: IndexMap<String, Value>, dataframes: IndexMap<String, Frame>) -> Self {
        Self {
            metadata,
            dataframes,
        }
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: &str) -> Result<&Value> {
        self.metadata
            .get(key)
            .ok_or_else(|| Error::MetadataNotFound(key.to_string()))
    }

    /// Look up a frame by name
    pub fn frame(&self, name: &str) -> Result<&Frame> {
        self.dataframes
            .get(name)
            .ok_or_else(|| Error::FrameNotFound(name.to_string()))
    }

    /// Set a metadata value, returning the previous one
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.metadata.insert(key.into(), value.into())
    }

    /// Set a frame, returning the previous one
    pub fn set_frame(&mut self, name: impl Into<String>, frame: Frame) -> Option<Frame> {
        self.dataframes.insert(name.into(), frame)
    }

    /// All frames in definition order
    pub fn frames(&self) -> &IndexMap<String, Frame> {
        &self.dataframes
    }

    /// Names of all frames
    pub fn frame_names(&self) -> impl Iterator<Item = &str> {
        self.dataframes.keys().map(String::as_str)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "======Data======")?;

        writeln!(f, "\nMetadata:")?;
        for (field, value) in &self.metadata {
            writeln!(f, "{field}: {value}")?;
        }

        writeln!(f, "\nDataframes:")?;
        for (name, frame) in &self.dataframes {
            writeln!(f, "- {name}:")?;
            write!(f, "{}", frame.head(HEAD_ROWS))?;
            writeln!(f, "...")?;
        }

        writeln!(f, "==================")
    }
}
