//! Parser traits for event files
//!
//! A parser turns a path into a loaded [`EventFile`]; the loaded file is the
//! opaque handle fields are extracted from by tag.

use std::path::Path;

use trkx_data_core::FieldArray;

use crate::error::Result;

/// A format-specific adapter that loads event files
pub trait EventFileParser: Send + Sync {
    /// Load the file at `path` into memory
    fn load(&self, path: &Path) -> Result<Box<dyn EventFile>>;
}

/// Closures can be registered directly as parsers
impl<F> EventFileParser for F
where
    F: Fn(&Path) -> Result<Box<dyn EventFile>> + Send + Sync,
{
    fn load(&self, path: &Path) -> Result<Box<dyn EventFile>> {
        self(path)
    }
}

/// A loaded event file
pub trait EventFile {
    /// Extract the field stored under `tag`
    fn extract(&self, tag: &str) -> Result<FieldArray>;

    /// Tags available in this file
    fn tags(&self) -> Vec<String>;
}
