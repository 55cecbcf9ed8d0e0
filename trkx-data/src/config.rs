//! Reader configuration
//!
//! The YAML document is first deserialized into raw structures that mirror
//! the file, then validated against the active parser and processor
//! registries into an [`EventDefinition`]. Validation errors name the dotted
//! key they were found at.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use trkx_data_core::{Parameters, ProcessingStep, ProcessorRegistry};
use trkx_data_readers::{FieldSpec, ParserRegistry};

use crate::error::{Error, Result};
use crate::template::PathTemplate;

/// Symbol blocks: `module: {short_name: Symbol}`
pub type SymbolBlocks = IndexMap<String, IndexMap<String, String>>;

/// Configuration file as written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    /// Parser registry additions
    #[serde(default)]
    pub parsers: SymbolBlocks,

    /// Processor registry additions
    #[serde(default)]
    pub processors: SymbolBlocks,

    /// Event definition
    #[serde(default)]
    pub event: Option<RawEvent>,

    /// Every remaining top-level key declares a variable
    #[serde(flatten)]
    pub variables: IndexMap<String, YamlValue>,
}

/// `event` block as written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    /// File id to file definition
    #[serde(default)]
    pub files: Option<IndexMap<String, RawFile>>,

    /// Frame name to per-file column definitions
    #[serde(default)]
    pub data: Option<IndexMap<String, IndexMap<String, IndexMap<String, RawField>>>>,
}

/// One entry of `event.files`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFile {
    /// Path template
    pub file: Option<String>,
    /// Parser id
    pub parser: Option<String>,
}

/// One column definition
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    /// Bare tag
    Tag(String),

    /// Tag with processing steps, each a single-key mapping
    Processed {
        /// Tag to extract
        tag: String,
        /// Steps applied in order
        #[serde(default)]
        processing: Vec<IndexMap<String, YamlValue>>,
    },
}

impl RawConfig {
    /// Parse a configuration document
    pub fn from_yaml_str(path: &Path, source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(path, &source)
    }
}

/// One event file
#[derive(Debug, Clone, PartialEq)]
pub struct FileDefinition {
    /// Path template, relative to the base directory
    pub template: PathTemplate,
    /// Parser id
    pub parser: String,
}

/// One output frame: the columns each file contributes, in order
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDefinition {
    /// File id to column name to field
    pub sources: IndexMap<String, IndexMap<String, FieldSpec>>,
}

/// Validated `event` block
#[derive(Debug, Clone, PartialEq)]
pub struct EventDefinition {
    /// Files loaded for every event
    pub files: IndexMap<String, FileDefinition>,
    /// Frames assembled for every event
    pub frames: IndexMap<String, FrameDefinition>,
}

impl EventDefinition {
    /// Validate the raw `event` block
    pub fn validate(
        raw: Option<&RawEvent>,
        parsers: &ParserRegistry,
        processors: &ProcessorRegistry,
    ) -> Result<Self> {
        let raw = raw.ok_or_else(|| Error::config("event", "event definition not found"))?;

        let raw_files = raw
            .files
            .as_ref()
            .ok_or_else(|| Error::config("event.files", "file definitions not found"))?;
        let mut files = IndexMap::with_capacity(raw_files.len());
        for (id, file) in raw_files {
            files.insert(id.clone(), validate_file(id, file, parsers)?);
        }

        let raw_frames = raw
            .data
            .as_ref()
            .ok_or_else(|| Error::config("event.data", "data definitions not found"))?;
        let mut frames = IndexMap::with_capacity(raw_frames.len());
        for (name, sources) in raw_frames {
            let key = format!("event.data.{name}");
            if sources.is_empty() {
                return Err(Error::config(key, "frame has no file contributions"));
            }

            let mut frame = IndexMap::with_capacity(sources.len());
            for (file_id, columns) in sources {
                let key = format!("{key}.{file_id}");
                if !files.contains_key(file_id) {
                    return Err(Error::config(
                        key,
                        format!("'{file_id}' is not declared in event.files"),
                    ));
                }

                let mut fields = IndexMap::with_capacity(columns.len());
                for (column, field) in columns {
                    let key = format!("{key}.{column}");
                    fields.insert(column.clone(), validate_field(&key, field, processors)?);
                }
                frame.insert(file_id.clone(), fields);
            }
            frames.insert(name.clone(), FrameDefinition { sources: frame });
        }

        Ok(Self { files, frames })
    }

    /// Variable names referenced by any file template
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.files.values().flat_map(|file| file.template.placeholders())
    }
}

fn validate_file(id: &str, file: &RawFile, parsers: &ParserRegistry) -> Result<FileDefinition> {
    let key = format!("event.files.{id}");

    let template = file
        .file
        .as_deref()
        .ok_or_else(|| Error::config(format!("{key}.file"), "file path not defined"))?;
    let parser = file
        .parser
        .as_deref()
        .ok_or_else(|| Error::config(format!("{key}.parser"), "parser not defined"))?;

    if !parsers.contains(parser) {
        return Err(Error::config(
            format!("{key}.parser"),
            format!("parser '{parser}' is not registered"),
        ));
    }

    Ok(FileDefinition {
        template: PathTemplate::parse(template)?,
        parser: parser.to_string(),
    })
}

fn validate_field(key: &str, field: &RawField, processors: &ProcessorRegistry) -> Result<FieldSpec> {
    let (tag, raw_steps) = match field {
        RawField::Tag(tag) => return Ok(FieldSpec::Tag(tag.clone())),
        RawField::Processed { tag, processing } => (tag, processing),
    };

    let mut processing = Vec::with_capacity(raw_steps.len());
    for (i, step) in raw_steps.iter().enumerate() {
        let key = format!("{key}.processing[{i}]");

        let mut entries = step.iter();
        let (Some((processor, parameters)), None) = (entries.next(), entries.next()) else {
            return Err(Error::config(
                key,
                "a processing step must have exactly one processor key",
            ));
        };

        if !processors.contains(processor) {
            return Err(Error::config(
                key,
                format!("processor '{processor}' is not registered"),
            ));
        }

        let parameters = Parameters::from_yaml(parameters)
            .map_err(|e| Error::config(format!("{key}.{processor}"), e.to_string()))?;
        processing.push(ProcessingStep::new(processor.clone(), parameters));
    }

    Ok(FieldSpec::Processed {
        tag: tag.clone(),
        processing,
    })
}
