//! Registry of event file parsers
//!
//! An entry is either a usable parser or the name of a capability this build
//! or runtime lacks. Unavailable entries still count as registered, so
//! configurations naming them validate; loading through them fails.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::csv::CsvParser;
use crate::error::{Error, Result};
use crate::npz::NpzParser;
use crate::parser::{EventFile, EventFileParser};

/// A registered parser id
#[derive(Clone)]
pub enum ParserEntry {
    /// Parser ready to load files
    Available(Arc<dyn EventFileParser>),

    /// Parser whose dependency is missing
    Unavailable {
        /// Human-readable name of the missing capability
        capability: String,
    },
}

impl fmt::Debug for ParserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserEntry::Available(_) => f.write_str("Available"),
            ParserEntry::Unavailable { capability } => {
                f.debug_struct("Unavailable").field("capability", capability).finish()
            }
        }
    }
}

/// Registry mapping parser ids to entries
#[derive(Clone, Default, Debug)]
pub struct ParserRegistry {
    entries: IndexMap<String, ParserEntry>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in parsers
    ///
    /// Parsers compiled out of this build are registered as unavailable.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NpzParser::ID, NpzParser);
        registry.register(CsvParser::ID, CsvParser::default());

        #[cfg(feature = "pyg")]
        registry.register(crate::graph::GraphParser::ID, crate::graph::GraphParser);
        #[cfg(not(feature = "pyg"))]
        registry.register_unavailable("pyg.pickle", "PyTorch Geometric");

        #[cfg(feature = "tensorboard")]
        registry.register(
            crate::scalar_log::ScalarLogParser::ID,
            crate::scalar_log::ScalarLogParser::default(),
        );
        #[cfg(not(feature = "tensorboard"))]
        registry.register_unavailable("tensorboard.scalars", "TensorBoard event decoding");

        registry
    }

    /// Register a parser, replacing any entry with the same id
    pub fn register(&mut self, id: impl Into<String>, parser: impl EventFileParser + 'static) {
        self.entries
            .insert(id.into(), ParserEntry::Available(Arc::new(parser)));
    }

    /// Register an already shared parser
    pub fn register_shared(&mut self, id: impl Into<String>, parser: Arc<dyn EventFileParser>) {
        self.entries.insert(id.into(), ParserEntry::Available(parser));
    }

    /// Register an id whose parser cannot run here
    pub fn register_unavailable(&mut self, id: impl Into<String>, capability: impl Into<String>) {
        self.entries.insert(
            id.into(),
            ParserEntry::Unavailable {
                capability: capability.into(),
            },
        );
    }

    /// Add every entry of `other`, overriding ids already present
    pub fn merge(&mut self, other: &ParserRegistry) {
        for (id, entry) in &other.entries {
            self.entries.insert(id.clone(), entry.clone());
        }
    }

    /// Look up an entry
    pub fn get(&self, id: &str) -> Option<&ParserEntry> {
        self.entries.get(id)
    }

    /// Check if an id is registered, available or not
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Check if an id is registered and usable
    pub fn is_available(&self, id: &str) -> bool {
        matches!(self.entries.get(id), Some(ParserEntry::Available(_)))
    }

    /// Registered ids in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Load `path` with the parser registered under `id`
    pub fn load(&self, id: &str, path: &Path) -> Result<Box<dyn EventFile>> {
        match self.entries.get(id) {
            Some(ParserEntry::Available(parser)) => {
                debug!(parser = id, path = %path.display(), "loading event file");
                parser.load(path)
            }
            Some(ParserEntry::Unavailable { capability }) => Err(Error::CapabilityUnavailable {
                parser: id.to_string(),
                capability: capability.clone(),
            }),
            None => Err(Error::ParserNotFound(id.to_string())),
        }
    }
}
