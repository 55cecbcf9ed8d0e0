//! Processor trait and registry for field transformations
//!
//! A processor is a named, parameterised, stateless transformation of a
//! [`FieldArray`]. Processing pipelines are ordered lists of
//! [`ProcessingStep`]s whose processors are looked up in a
//! [`ProcessorRegistry`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_yaml::Value as YamlValue;
use tracing::trace;

use crate::array::FieldArray;
use crate::error::{Error, Result};

/// A stateless transformation of a field array
pub trait Processor: Send + Sync {
    /// Transform `data` according to `params`
    fn process(&self, data: FieldArray, params: &Parameters) -> Result<FieldArray>;
}

/// Closures can be registered directly as processors
impl<F> Processor for F
where
    F: Fn(FieldArray, &Parameters) -> Result<FieldArray> + Send + Sync,
{
    fn process(&self, data: FieldArray, params: &Parameters) -> Result<FieldArray> {
        self(data, params)
    }
}

/// An index parameter: one position, or a list of positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    /// A single index; selecting with it removes the axis
    Single(i64),
    /// A list of indices; selecting with it keeps the axis
    List(Vec<i64>),
}

/// Parameters of one processing step, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<String, YamlValue>,
}

impl Parameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for programmatic pipelines
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<YamlValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Build parameters from a YAML node
    ///
    /// `null` means "no parameters"; anything other than a mapping with
    /// string keys is rejected.
    pub fn from_yaml(value: &YamlValue) -> Result<Self> {
        match value {
            YamlValue::Null => Ok(Self::new()),
            YamlValue::Mapping(mapping) => {
                let mut values = IndexMap::with_capacity(mapping.len());
                for (key, value) in mapping {
                    let key = key.as_str().ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "Parameter names must be strings, got {key:?}"
                        ))
                    })?;
                    values.insert(key.to_string(), value.clone());
                }
                Ok(Self { values })
            }
            other => Err(Error::InvalidArgument(format!(
                "Parameters must be a mapping, got {other:?}"
            ))),
        }
    }

    /// Raw value of a parameter
    pub fn get(&self, name: &str) -> Option<&YamlValue> {
        self.values.get(name)
    }

    /// Whether a parameter is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric parameter
    pub fn get_f64(&self, processor: &str, name: &str) -> Result<Option<f64>> {
        self.values
            .get(name)
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| invalid(processor, name, "expected a number"))
            })
            .transpose()
    }

    /// Index parameter, either an integer or a list of integers
    pub fn get_indices(&self, processor: &str, name: &str) -> Result<Option<Indices>> {
        let Some(value) = self.values.get(name) else {
            return Ok(None);
        };

        if let Some(index) = value.as_i64() {
            return Ok(Some(Indices::Single(index)));
        }

        let list = value
            .as_sequence()
            .ok_or_else(|| invalid(processor, name, "expected an integer or a list of integers"))?;
        let indices = list
            .iter()
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| invalid(processor, name, "list entries must be integers"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Indices::List(indices)))
    }

    /// List of non-negative integers, such as an axis order
    pub fn get_usize_list(&self, processor: &str, name: &str) -> Result<Option<Vec<usize>>> {
        let Some(value) = self.values.get(name) else {
            return Ok(None);
        };

        let list = value
            .as_sequence()
            .ok_or_else(|| invalid(processor, name, "expected a list of integers"))?;
        list.iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| invalid(processor, name, "entries must be non-negative integers"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

fn invalid(processor: &str, parameter: &str, reason: &str) -> Error {
    Error::InvalidParameter {
        processor: processor.to_string(),
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}

/// One step of a processing pipeline: a processor id and its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingStep {
    /// Registered processor id
    pub processor: String,

    /// Parameters passed to the processor
    pub parameters: Parameters,
}

impl ProcessingStep {
    /// Create a new processing step
    pub fn new(processor: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            processor: processor.into(),
            parameters,
        }
    }
}

/// Registry mapping processor ids to processors
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: IndexMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor, replacing any processor with the same id
    pub fn register(&mut self, name: impl Into<String>, processor: impl Processor + 'static) {
        self.processors.insert(name.into(), Arc::new(processor));
    }

    /// Register an already shared processor
    pub fn register_shared(&mut self, name: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(name.into(), processor);
    }

    /// Add every processor of `other`, overriding ids already present
    pub fn merge(&mut self, other: &ProcessorRegistry) {
        for (name, processor) in &other.processors {
            self.processors.insert(name.clone(), Arc::clone(processor));
        }
    }

    /// Look up a processor
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Processor>> {
        self.processors
            .get(name)
            .ok_or_else(|| Error::ProcessorNotFound(name.to_string()))
    }

    /// Check if a processor is registered
    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Registered ids in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.processors.keys().map(String::as_str)
    }

    /// Apply a single step
    pub fn apply(&self, step: &ProcessingStep, data: FieldArray) -> Result<FieldArray> {
        let processor = self.get(&step.processor)?;
        trace!(processor = %step.processor, shape = ?data.shape(), "applying processor");
        processor.process(data, &step.parameters)
    }

    /// Thread `data` through `steps` from left to right
    pub fn run(&self, steps: &[ProcessingStep], data: FieldArray) -> Result<FieldArray> {
        let mut current = data;

        for step in steps {
            current = self.apply(step, current)?;
        }

        Ok(current)
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array;

    fn add_offset(data: FieldArray, params: &Parameters) -> Result<FieldArray> {
        let offset = params.get_f64("add", "offset")?.unwrap_or(0.0);
        Ok(data + offset)
    }

    #[test]
    fn test_register_closure_and_function() {
        let mut registry = ProcessorRegistry::new();
        registry.register("add", add_offset);
        registry.register("double", |data: FieldArray, _: &Parameters| -> Result<FieldArray> {
            Ok(data * 2.0)
        });

        assert!(registry.contains("add"));
        assert!(registry.contains("double"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["add", "double"]);
    }

    #[test]
    fn test_run_applies_steps_in_order() {
        let mut registry = ProcessorRegistry::new();
        registry.register("add", add_offset);
        registry.register("double", |data: FieldArray, _: &Parameters| -> Result<FieldArray> {
            Ok(data * 2.0)
        });

        let steps = vec![
            ProcessingStep::new("add", Parameters::new().with("offset", 1.0)),
            ProcessingStep::new("double", Parameters::new()),
        ];
        let result = registry.run(&steps, array::from_vec(vec![1.0, 2.0])).unwrap();

        assert_eq!(result, array::from_vec(vec![4.0, 6.0]));
    }

    #[test]
    fn test_run_empty_pipeline_is_identity() {
        let registry = ProcessorRegistry::new();
        let data = array::from_vec(vec![3.0, 1.0]);
        assert_eq!(registry.run(&[], data.clone()).unwrap(), data);
    }

    #[test]
    fn test_unknown_processor() {
        let registry = ProcessorRegistry::new();
        let steps = vec![ProcessingStep::new("missing", Parameters::new())];
        let result = registry.run(&steps, array::from_vec(vec![1.0]));
        assert!(matches!(result, Err(Error::ProcessorNotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_parameters_from_yaml() {
        let yaml: YamlValue = serde_yaml::from_str("{axes: [1, 0], scale: 2}").unwrap();
        let params = Parameters::from_yaml(&yaml).unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params.get_usize_list("transpose", "axes").unwrap(), Some(vec![1, 0]));
        assert_eq!(params.get_f64("normalize", "scale").unwrap(), Some(2.0));
        assert_eq!(params.get_f64("normalize", "missing").unwrap(), None);

        assert!(Parameters::from_yaml(&YamlValue::Null).unwrap().is_empty());
        assert!(Parameters::from_yaml(&YamlValue::from(3)).is_err());
    }

    #[test]
    fn test_indices_parameter() {
        let yaml: YamlValue = serde_yaml::from_str("{row: 1, column: [0, -1], key: x}").unwrap();
        let params = Parameters::from_yaml(&yaml).unwrap();

        assert_eq!(params.get_indices("select", "row").unwrap(), Some(Indices::Single(1)));
        assert_eq!(
            params.get_indices("select", "column").unwrap(),
            Some(Indices::List(vec![0, -1]))
        );
        assert!(matches!(
            params.get_indices("select", "key"),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
