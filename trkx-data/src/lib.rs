//! Configuration-driven event data reader
//!
//! A YAML file declares variables, the files every event is made of and the
//! frames assembled from their fields:
//!
//! ```yaml
//! evtid:
//!   range: [1000, 1010]
//! event:
//!   files:
//!     hits:
//!       file: "event{evtid:09d}-hits.csv"
//!       parser: pandas.csv
//!   data:
//!     hits:
//!       hits:
//!         hit_id: hit_id
//!         x: { tag: x, processing: [ { normalize: { scale: 1000 } } ] }
//! ```
//!
//! [`DataReader`] reads one [`Data`] container per combination of variable
//! values.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod reader;
pub mod template;
pub mod variables;

pub use config::{EventDefinition, FileDefinition, FrameDefinition};
pub use error::{Error, Result};
pub use reader::{DataReader, DataReaderBuilder, Events};
pub use template::{Bindings, PathTemplate};
pub use variables::{Combinations, VariableSource, Variables};

pub use trkx_data_core::{Data, FieldArray, Frame, Parameters, Processor, Value};
pub use trkx_data_readers::{EventFile, EventFileParser, FieldSpec};
