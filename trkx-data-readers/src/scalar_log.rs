//! TensorBoard scalar event files
//!
//! Event files are a sequence of TFRecord frames, each holding one `Event`
//! protobuf. Every scalar summary is collected per tag as `(step, value)`
//! rows in file order.
//!
//! Frame layout:
//! - 8 bytes: payload length (u64 little endian)
//! - 4 bytes: masked CRC32C of the length bytes
//! - N bytes: payload
//! - 4 bytes: masked CRC32C of the payload

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use prost::Message;
use tracing::{debug, trace};
use trkx_data_core::{array, FieldArray};

use crate::error::{Error, Result};
use crate::parser::{EventFile, EventFileParser};

/// `DataType::DT_FLOAT`
const DT_FLOAT: i32 = 1;
/// `DataType::DT_DOUBLE`
const DT_DOUBLE: i32 = 2;

const CRC_MASK_DELTA: u32 = 0xa282_ead8;
const CRC32C_POLY: u32 = 0x82f6_3b78;
const CRC32C_TABLE: [u32; 256] = crc32c_table();

/// One record of an event file
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    /// Seconds since the epoch
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    /// Global step
    #[prost(int64, tag = "2")]
    pub step: i64,
    /// Summary payload, absent for version and graph records
    #[prost(message, optional, tag = "5")]
    pub summary: Option<Summary>,
}

/// Set of tagged summary values
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Summary {
    /// Values recorded at this step
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<SummaryValue>,
}

/// A single tagged value
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryValue {
    /// Tag the value was logged under
    #[prost(string, tag = "1")]
    pub tag: String,
    /// Scalar written by the TF1 summary API
    #[prost(float, optional, tag = "2")]
    pub simple_value: Option<f32>,
    /// Tensor written by the TF2 and PyTorch summary writers
    #[prost(message, optional, tag = "8")]
    pub tensor: Option<TensorProto>,
}

/// Subset of the tensor message needed for scalars
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    /// Element type
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    /// Packed little-endian element bytes
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    /// Float elements
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    /// Double elements
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
}

impl TensorProto {
    /// The value of a one-element float or double tensor
    fn scalar(&self) -> Option<f64> {
        match self.dtype {
            DT_FLOAT => match (self.float_val.as_slice(), self.tensor_content.as_slice()) {
                ([value], _) => Some(f64::from(*value)),
                ([], bytes) => {
                    let bytes: [u8; 4] = bytes.try_into().ok()?;
                    Some(f64::from(f32::from_le_bytes(bytes)))
                }
                _ => None,
            },
            DT_DOUBLE => match (self.double_val.as_slice(), self.tensor_content.as_slice()) {
                ([value], _) => Some(*value),
                ([], bytes) => {
                    let bytes: [u8; 8] = bytes.try_into().ok()?;
                    Some(f64::from_le_bytes(bytes))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl SummaryValue {
    fn scalar(&self) -> Option<f64> {
        self.simple_value
            .map(f64::from)
            .or_else(|| self.tensor.as_ref().and_then(TensorProto::scalar))
    }
}

/// Options for reading scalar event files
#[derive(Debug, Clone)]
pub struct ScalarLogOptions {
    /// Verify the CRC of every frame
    pub validate_checksums: bool,
}

impl Default for ScalarLogOptions {
    fn default() -> Self {
        Self {
            validate_checksums: true,
        }
    }
}

/// Parser for TensorBoard event files, registered as `tensorboard.scalars`
#[derive(Debug, Clone, Default)]
pub struct ScalarLogParser {
    options: ScalarLogOptions,
}

impl ScalarLogParser {
    /// Registry id
    pub const ID: &'static str = "tensorboard.scalars";

    /// Create a parser with the given options
    pub fn new(options: ScalarLogOptions) -> Self {
        Self { options }
    }
}

impl EventFileParser for ScalarLogParser {
    fn load(&self, path: &Path) -> Result<Box<dyn EventFile>> {
        let bytes = std::fs::read(path)?;
        let mut records = RecordReader {
            path,
            data: &bytes,
            position: 0,
            validate_checksums: self.options.validate_checksums,
        };

        let mut series: IndexMap<String, Vec<[f64; 2]>> = IndexMap::new();
        let mut events = 0usize;
        while let Some(payload) = records.next_record()? {
            let event = Event::decode(payload)?;
            events += 1;

            let Some(summary) = event.summary else {
                continue;
            };
            for value in summary.value {
                match value.scalar() {
                    #[allow(clippy::cast_precision_loss)]
                    Some(scalar) => series
                        .entry(value.tag)
                        .or_default()
                        .push([event.step as f64, scalar]),
                    None => trace!(tag = %value.tag, "skipping non-scalar summary"),
                }
            }
        }

        debug!(
            path = %path.display(),
            events,
            tags = series.len(),
            "loaded scalar event file"
        );
        Ok(Box::new(ScalarLog {
            path: path.to_path_buf(),
            series,
        }))
    }
}

/// Scalar series of a loaded event file, keyed by tag
pub struct ScalarLog {
    path: PathBuf,
    series: IndexMap<String, Vec<[f64; 2]>>,
}

impl EventFile for ScalarLog {
    fn extract(&self, tag: &str) -> Result<FieldArray> {
        let rows = self.series.get(tag).ok_or_else(|| Error::FieldNotFound {
            tag: tag.to_string(),
            path: self.path.clone(),
            available: self.tags().join(", "),
        })?;

        let values = rows.iter().flatten().copied().collect();
        Ok(array::from_shape_vec(&[rows.len(), 2], values)?)
    }

    fn tags(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }
}

/// Cursor over the TFRecord frames of an in-memory file
struct RecordReader<'a> {
    path: &'a Path,
    data: &'a [u8],
    position: usize,
    validate_checksums: bool,
}

impl<'a> RecordReader<'a> {
    fn next_record(&mut self) -> Result<Option<&'a [u8]>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }

        let length_bytes = self.take(8)?;
        let length_crc = u32::from_le_bytes(self.take_array()?);
        self.check_crc("length", length_bytes, length_crc)?;

        let length = u64::from_le_bytes(
            length_bytes
                .try_into()
                .map_err(|_| Error::format(self.path, "malformed record length"))?,
        );
        let length = usize::try_from(length)
            .map_err(|_| Error::format(self.path, format!("record length {length} too large")))?;

        let payload = self.take(length)?;
        let payload_crc = u32::from_le_bytes(self.take_array()?);
        self.check_crc("payload", payload, payload_crc)?;

        Ok(Some(payload))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                Error::format(
                    self.path,
                    format!("truncated record at byte {}", self.position),
                )
            })?;
        let data = self.data;
        let slice = &data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn take_array(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(4)?;
        bytes
            .try_into()
            .map_err(|_| Error::format(self.path, "malformed record checksum"))
    }

    fn check_crc(&self, what: &str, bytes: &[u8], expected: u32) -> Result<()> {
        if !self.validate_checksums {
            return Ok(());
        }
        let actual = mask_crc(crc32c(bytes));
        if actual != expected {
            return Err(Error::format(
                self.path,
                format!("{what} CRC mismatch: expected {expected:#010x}, got {actual:#010x}"),
            ));
        }
        Ok(())
    }
}

const fn crc32c_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        #[allow(clippy::cast_possible_truncation)]
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC32C_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC32C (Castagnoli) checksum
fn crc32c(data: &[u8]) -> u32 {
    let crc = data.iter().fold(!0u32, |crc, &byte| {
        CRC32C_TABLE[((crc ^ u32::from(byte)) & 0xff) as usize] ^ (crc >> 8)
    });
    !crc
}

/// Mask a CRC the way TFRecord writers store it
fn mask_crc(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(CRC_MASK_DELTA)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let length = (payload.len() as u64).to_le_bytes();
        let mut out = Vec::new();
        out.extend_from_slice(&length);
        out.extend_from_slice(&mask_crc(crc32c(&length)).to_le_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(&mask_crc(crc32c(payload)).to_le_bytes());
        out
    }

    fn scalar_event(step: i64, tag: &str, value: f32) -> Event {
        Event {
            wall_time: 1.0,
            step,
            summary: Some(Summary {
                value: vec![SummaryValue {
                    tag: tag.to_string(),
                    simple_value: Some(value),
                    tensor: None,
                }],
            }),
        }
    }

    fn tensor_event(step: i64, tag: &str, tensor: TensorProto) -> Event {
        Event {
            wall_time: 1.0,
            step,
            summary: Some(Summary {
                value: vec![SummaryValue {
                    tag: tag.to_string(),
                    simple_value: None,
                    tensor: Some(tensor),
                }],
            }),
        }
    }

    fn write_log(dir: &tempfile::TempDir, events: &[Event]) -> PathBuf {
        let path = dir.path().join("events.out.tfevents");
        let mut bytes = Vec::new();
        for event in events {
            bytes.extend(frame(&event.encode_to_vec()));
        }
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xe306_9283);
        assert_eq!(crc32c(b""), 0);
    }

    #[test]
    fn test_simple_values_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let version = Event {
            wall_time: 0.0,
            step: 0,
            summary: None,
        };
        let path = write_log(
            &dir,
            &[
                version,
                scalar_event(0, "loss", 1.5),
                scalar_event(1, "accuracy", 0.25),
                scalar_event(1, "loss", 0.5),
            ],
        );

        let log = ScalarLogParser::default().load(&path).unwrap();
        assert_eq!(log.tags(), vec!["loss", "accuracy"]);

        let loss = log.extract("loss").unwrap();
        assert_eq!(loss.shape(), &[2, 2]);
        assert_eq!(loss.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.5, 1.0, 0.5]);
    }

    #[test]
    fn test_tensor_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(
            &dir,
            &[
                tensor_event(
                    3,
                    "lr",
                    TensorProto {
                        dtype: DT_FLOAT,
                        float_val: vec![0.125],
                        ..Default::default()
                    },
                ),
                tensor_event(
                    4,
                    "lr",
                    TensorProto {
                        dtype: DT_DOUBLE,
                        tensor_content: 0.0625_f64.to_le_bytes().to_vec(),
                        ..Default::default()
                    },
                ),
                tensor_event(
                    5,
                    "histogram",
                    TensorProto {
                        dtype: DT_FLOAT,
                        float_val: vec![1.0, 2.0],
                        ..Default::default()
                    },
                ),
            ],
        );

        let log = ScalarLogParser::default().load(&path).unwrap();
        assert_eq!(log.tags(), vec!["lr"]);
        let lr = log.extract("lr").unwrap();
        assert_eq!(lr.iter().copied().collect::<Vec<_>>(), vec![3.0, 0.125, 4.0, 0.0625]);
    }

    #[test]
    fn test_corrupted_payload_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[scalar_event(0, "loss", 1.0)]);
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();

        let result = ScalarLogParser::default().load(&path);
        assert!(matches!(result, Err(Error::Format { ref message, .. }) if message.contains("CRC")));

        let lenient = ScalarLogParser::new(ScalarLogOptions {
            validate_checksums: false,
        });
        assert!(lenient.load(&path).is_ok());
    }

    #[test]
    fn test_truncated_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[scalar_event(0, "loss", 1.0)]);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 6]).unwrap();

        let result = ScalarLogParser::default().load(&path);
        assert!(matches!(result, Err(Error::Format { ref message, .. }) if message.contains("truncated")));
    }

    #[test]
    fn test_unknown_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[scalar_event(0, "loss", 1.0)]);
        let log = ScalarLogParser::default().load(&path).unwrap();
        assert!(matches!(log.extract("acc"), Err(Error::FieldNotFound { .. })));
    }
}
