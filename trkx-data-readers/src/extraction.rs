//! Field extraction pipeline shared by all parsers
//!
//! A field specification names a tag in a loaded file and, optionally, the
//! processing steps the extracted array goes through before it becomes an
//! output column.

use indexmap::IndexMap;
use tracing::trace;
use trkx_data_core::{FieldArray, ProcessingStep, ProcessorRegistry};

use crate::error::Result;
use crate::parser::EventFile;

/// How one output column is produced from a loaded file
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Extract the tag as is
    Tag(String),

    /// Extract the tag, then apply the steps from left to right
    Processed {
        /// Tag to extract
        tag: String,
        /// Processing steps
        processing: Vec<ProcessingStep>,
    },
}

impl FieldSpec {
    /// Tag this field is extracted from
    pub fn tag(&self) -> &str {
        match self {
            FieldSpec::Tag(tag) | FieldSpec::Processed { tag, .. } => tag,
        }
    }

    /// Processing steps, empty for a bare tag
    pub fn steps(&self) -> &[ProcessingStep] {
        match self {
            FieldSpec::Tag(_) => &[],
            FieldSpec::Processed { processing, .. } => processing,
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(tag: &str) -> Self {
        FieldSpec::Tag(tag.to_string())
    }
}

/// Extract one field and run it through its processing steps
pub fn extract_field(
    file: &dyn EventFile,
    spec: &FieldSpec,
    processors: &ProcessorRegistry,
) -> Result<FieldArray> {
    let data = file.extract(spec.tag())?;

    let steps = spec.steps();
    if steps.is_empty() {
        return Ok(data);
    }

    trace!(tag = spec.tag(), steps = steps.len(), "processing field");
    Ok(processors.run(steps, data)?)
}

/// Extract every field of one file contribution, keeping column order
pub fn extract_fields(
    file: &dyn EventFile,
    fields: &IndexMap<String, FieldSpec>,
    processors: &ProcessorRegistry,
) -> Result<Vec<(String, FieldArray)>> {
    fields
        .iter()
        .map(|(name, spec)| Ok((name.clone(), extract_field(file, spec, processors)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use trkx_data_core::{array, Parameters};
    use trkx_data_transforms::default_processors;

    struct MemoryFile {
        fields: IndexMap<String, FieldArray>,
    }

    impl EventFile for MemoryFile {
        fn extract(&self, tag: &str) -> Result<FieldArray> {
            self.fields.get(tag).cloned().ok_or_else(|| Error::FieldNotFound {
                tag: tag.to_string(),
                path: "memory".into(),
                available: self.tags().join(", "),
            })
        }

        fn tags(&self) -> Vec<String> {
            self.fields.keys().cloned().collect()
        }
    }

    fn file() -> MemoryFile {
        let mut fields = IndexMap::new();
        fields.insert(
            "edge_index".to_string(),
            array::from_shape_vec(&[2, 3], vec![0.0, 1.0, 2.0, 1.0, 2.0, 0.0]).unwrap(),
        );
        fields.insert("x".to_string(), array::from_vec(vec![2.0, 4.0, 6.0]));
        MemoryFile { fields }
    }

    #[test]
    fn test_empty_pipeline_matches_raw_extract() {
        let file = file();
        let processors = default_processors();
        let spec = FieldSpec::Processed {
            tag: "x".to_string(),
            processing: Vec::new(),
        };

        let raw = file.extract("x").unwrap();
        assert_eq!(extract_field(&file, &spec, &processors).unwrap(), raw);
        assert_eq!(extract_field(&file, &FieldSpec::from("x"), &processors).unwrap(), raw);
    }

    #[test]
    fn test_pipeline_threads_array() {
        let file = file();
        let processors = default_processors();
        let spec = FieldSpec::Processed {
            tag: "edge_index".to_string(),
            processing: vec![
                ProcessingStep::new("transpose", Parameters::new().with("axes", vec![1_i64, 0])),
                ProcessingStep::new("select", Parameters::new().with("column", 0_i64)),
            ],
        };

        let result = extract_field(&file, &spec, &processors).unwrap();
        assert_eq!(result, array::from_vec(vec![0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_extract_fields_keeps_order() {
        let file = file();
        let processors = default_processors();
        let mut fields = IndexMap::new();
        fields.insert(
            "scaled".to_string(),
            FieldSpec::Processed {
                tag: "x".to_string(),
                processing: vec![ProcessingStep::new(
                    "normalize",
                    Parameters::new().with("scale", 2_i64),
                )],
            },
        );
        fields.insert("raw".to_string(), FieldSpec::from("x"));

        let result = extract_fields(&file, &fields, &processors).unwrap();
        assert_eq!(result[0].0, "scaled");
        assert_eq!(result[0].1, array::from_vec(vec![1.0, 2.0, 3.0]));
        assert_eq!(result[1].0, "raw");
    }

    #[test]
    fn test_missing_tag() {
        let file = file();
        let result = extract_field(&file, &FieldSpec::from("y"), &default_processors());
        assert!(matches!(result, Err(Error::FieldNotFound { ref tag, .. }) if tag == "y"));
    }

    #[test]
    fn test_processing_error_propagates() {
        let file = file();
        let spec = FieldSpec::Processed {
            tag: "x".to_string(),
            processing: vec![ProcessingStep::new(
                "transpose",
                Parameters::new().with("axes", vec![1_i64, 0]),
            )],
        };
        let result = extract_field(&file, &spec, &default_processors());
        assert!(matches!(
            result,
            Err(Error::Core(trkx_data_core::Error::AxesMismatch { rank: 1, .. }))
        ));
    }
}
