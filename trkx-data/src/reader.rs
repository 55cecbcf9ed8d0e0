//! Configuration-driven event reader
//!
//! A [`DataReader`] enumerates every combination of its variables, resolves
//! the file templates of the event definition for each one, loads the files
//! through the parser registry and assembles the declared frames.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use trkx_data_core::{Data, Frame, Processor, ProcessorRegistry, Value};
use trkx_data_readers::{extract_fields, EventFile, EventFileParser, ParserRegistry};
use trkx_data_transforms::default_processors;

use crate::config::{EventDefinition, RawConfig, SymbolBlocks};
use crate::error::{Error, Result};
use crate::template::Bindings;
use crate::variables::{Combinations, Variables};

/// Outcome of resolving the files of one event
enum Resolution {
    /// Every file exists, in event definition order
    Ready(Vec<PathBuf>),
    /// The first file that does not exist
    Missing(PathBuf),
}

/// Reads events described by a YAML configuration
#[derive(Debug, Clone)]
pub struct DataReader {
    config_path: PathBuf,
    base_dir: Option<PathBuf>,
    variables: Variables,
    parsers: ParserRegistry,
    processors: ProcessorRegistry,
    event: EventDefinition,
}

impl DataReader {
    /// Create a reader with the built-in parsers and processors
    pub fn new(config_path: impl AsRef<Path>, base_dir: Option<PathBuf>) -> Result<Self> {
        let mut builder = Self::builder(config_path);
        if let Some(base_dir) = base_dir {
            builder = builder.base_dir(base_dir);
        }
        builder.build()
    }

    /// Start configuring a reader
    pub fn builder(config_path: impl AsRef<Path>) -> DataReaderBuilder {
        DataReaderBuilder::new(config_path)
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory file templates are resolved against
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Variable table
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Active parser registry
    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Active processor registry
    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    /// Validated event definition
    pub fn event_definition(&self) -> &EventDefinition {
        &self.event
    }

    /// Replace a variable's values, or add a new variable
    pub fn set_variable(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.variables.set(name, values);
    }

    /// Pin a variable to a single value
    pub fn pin_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.pin(name, value);
    }

    /// Every combination of variable values, in read order
    pub fn combinations(&self) -> Combinations {
        self.variables.combinations()
    }

    /// Number of combinations a full read visits
    pub fn event_count(&self) -> usize {
        self.variables.combination_count()
    }

    /// Resolve every file path of one event
    pub fn resolve_paths(&self, bindings: &Bindings) -> Result<Vec<PathBuf>> {
        self.event
            .files
            .values()
            .map(|file| {
                let relative = PathBuf::from(file.template.render(bindings)?);
                Ok(match &self.base_dir {
                    Some(base) => base.join(relative),
                    None => relative,
                })
            })
            .collect()
    }

    fn resolve(&self, bindings: &Bindings) -> Result<Resolution> {
        let paths = self.resolve_paths(bindings)?;
        match paths.iter().find(|path| !path.exists()) {
            Some(missing) => Ok(Resolution::Missing(missing.clone())),
            None => Ok(Resolution::Ready(paths)),
        }
    }

    /// Read one event
    ///
    /// Returns `Ok(None)` when any file of the event does not exist.
    pub fn read_one(&self, bindings: &Bindings) -> Result<Option<Data>> {
        match self.resolve(bindings)? {
            Resolution::Ready(paths) => self.assemble(bindings, &paths).map(Some),
            Resolution::Missing(path) => {
                debug!(event = %describe(bindings), path = %path.display(), "event file not found");
                Ok(None)
            }
        }
    }

    /// Read one event, failing with [`Error::MissingFile`] when a file does not exist
    pub fn read_one_required(&self, bindings: &Bindings) -> Result<Data> {
        match self.resolve(bindings)? {
            Resolution::Ready(paths) => self.assemble(bindings, &paths),
            Resolution::Missing(path) => Err(Error::MissingFile(path)),
        }
    }

    /// Lazily read every combination
    ///
    /// Events with a missing file are skipped. Unless `silent_skip` is set,
    /// each skipped event logs one warning.
    pub fn read(&self, silent_skip: bool) -> Events<'_> {
        Events {
            reader: self,
            combinations: self.combinations(),
            silent_skip,
            skipped: 0,
        }
    }

    /// Read every combination at once
    pub fn read_all(&self, silent_skip: bool) -> Result<Vec<Data>> {
        self.read(silent_skip).collect()
    }

    fn assemble(&self, bindings: &Bindings, paths: &[PathBuf]) -> Result<Data> {
        let mut files: IndexMap<&str, Box<dyn EventFile>> = IndexMap::with_capacity(paths.len());
        for ((id, file), path) in self.event.files.iter().zip(paths) {
            files.insert(id.as_str(), self.parsers.load(&file.parser, path)?);
        }

        let mut dataframes = IndexMap::with_capacity(self.event.frames.len());
        for (name, frame) in &self.event.frames {
            let mut parts = Vec::with_capacity(frame.sources.len());
            for (file_id, fields) in &frame.sources {
                let file = files.get(file_id.as_str()).ok_or_else(|| {
                    Error::config(
                        format!("event.data.{name}.{file_id}"),
                        "file is not declared",
                    )
                })?;
                let columns = extract_fields(&**file, fields, &self.processors)?;
                parts.push(Frame::from_fields(columns)?);
            }

            let frame = Frame::concat(&parts);
            debug!(
                frame = %name,
                rows = frame.row_count(),
                columns = frame.column_count(),
                "assembled frame"
            );
            dataframes.insert(name.clone(), frame);
        }

        Ok(Data::new(bindings.clone(), dataframes))
    }
}

impl<'a> IntoIterator for &'a DataReader {
    type Item = Result<Data>;
    type IntoIter = Events<'a>;

    fn into_iter(self) -> Events<'a> {
        self.read(false)
    }
}

/// Lazy iterator over the events of a reader
pub struct Events<'a> {
    reader: &'a DataReader,
    combinations: Combinations,
    silent_skip: bool,
    skipped: usize,
}

impl Events<'_> {
    /// Number of events skipped so far because a file was missing
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Events<'_> {
    type Item = Result<Data>;

    fn next(&mut self) -> Option<Result<Data>> {
        for bindings in self.combinations.by_ref() {
            match self.reader.resolve(&bindings) {
                Ok(Resolution::Ready(paths)) => {
                    return Some(self.reader.assemble(&bindings, &paths));
                }
                Ok(Resolution::Missing(path)) => {
                    self.skipped += 1;
                    if !self.silent_skip {
                        warn!(
                            event = %describe(&bindings),
                            path = %path.display(),
                            "skipping event: file not found"
                        );
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

fn describe(bindings: &Bindings) -> String {
    bindings
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder for [`DataReader`]
///
/// Parsers and processors registered directly take precedence over the
/// built-in ones and over those named in the configuration. Symbols provided
/// with [`provide_parser`](Self::provide_parser) and
/// [`provide_processor`](Self::provide_processor) are what the configuration's
/// `parsers` and `processors` blocks resolve against, keyed `module.Symbol`.
pub struct DataReaderBuilder {
    config_path: PathBuf,
    base_dir: Option<PathBuf>,
    parsers: ParserRegistry,
    processors: ProcessorRegistry,
    parser_symbols: IndexMap<String, Arc<dyn EventFileParser>>,
    processor_symbols: IndexMap<String, Arc<dyn Processor>>,
}

impl DataReaderBuilder {
    /// Create a builder for the configuration at `config_path`
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            base_dir: None,
            parsers: ParserRegistry::new(),
            processors: ProcessorRegistry::new(),
            parser_symbols: IndexMap::new(),
            processor_symbols: IndexMap::new(),
        }
    }

    /// Resolve file templates against `base_dir`
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Register a parser under `id`
    pub fn parser(mut self, id: impl Into<String>, parser: impl EventFileParser + 'static) -> Self {
        self.parsers.register(id, parser);
        self
    }

    /// Register a processor under `id`
    pub fn processor(mut self, id: impl Into<String>, processor: impl Processor + 'static) -> Self {
        self.processors.register(id, processor);
        self
    }

    /// Provide a parser the configuration can name as `module: {id: Symbol}`
    pub fn provide_parser(
        mut self,
        symbol: impl Into<String>,
        parser: impl EventFileParser + 'static,
    ) -> Self {
        self.parser_symbols.insert(symbol.into(), Arc::new(parser));
        self
    }

    /// Provide a processor the configuration can name as `module: {id: Symbol}`
    pub fn provide_processor(
        mut self,
        symbol: impl Into<String>,
        processor: impl Processor + 'static,
    ) -> Self {
        self.processor_symbols.insert(symbol.into(), Arc::new(processor));
        self
    }

    /// Load and validate the configuration
    pub fn build(self) -> Result<DataReader> {
        let raw = RawConfig::from_file(&self.config_path)?;
        let variables = Variables::from_declarations(&raw.variables)?;

        let mut parsers = ParserRegistry::with_defaults();
        for (id, parser) in resolve_symbols("parsers", &raw.parsers, &self.parser_symbols)? {
            parsers.register_shared(id, parser);
        }
        parsers.merge(&self.parsers);

        let mut processors = default_processors();
        for (id, processor) in
            resolve_symbols("processors", &raw.processors, &self.processor_symbols)?
        {
            processors.register_shared(id, processor);
        }
        processors.merge(&self.processors);

        let event = EventDefinition::validate(raw.event.as_ref(), &parsers, &processors)?;

        let referenced: HashSet<&str> = event.placeholders().collect();
        for name in variables.names().filter(|name| !referenced.contains(name)) {
            debug!(variable = name, "variable is not referenced by any file template");
        }

        info!(
            config = %self.config_path.display(),
            variables = variables.len(),
            events = variables.combination_count(),
            files = event.files.len(),
            frames = event.frames.len(),
            "data reader ready"
        );

        Ok(DataReader {
            config_path: self.config_path,
            base_dir: self.base_dir,
            variables,
            parsers,
            processors,
            event,
        })
    }
}

/// Resolve `module: {id: Symbol}` blocks against provided symbols
fn resolve_symbols<T: ?Sized>(
    block: &str,
    blocks: &SymbolBlocks,
    provided: &IndexMap<String, Arc<T>>,
) -> Result<Vec<(String, Arc<T>)>> {
    let mut resolved = Vec::new();
    for (module, symbols) in blocks {
        for (id, symbol) in symbols {
            let qualified = format!("{module}.{symbol}");
            let value = provided.get(&qualified).ok_or_else(|| {
                Error::config(
                    format!("{block}.{module}.{id}"),
                    format!("symbol '{qualified}' was not provided"),
                )
            })?;
            resolved.push((id.clone(), Arc::clone(value)));
        }
    }
    Ok(resolved)
}
