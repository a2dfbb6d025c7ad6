//! Persisted dictionary form of evaluation results.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An array that may be missing from a persisted results dictionary.
///
/// A missing array stands for "every entry absent" and expands to a run of
/// `None` of the required length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionalArray<T>(Option<Vec<Option<T>>>);

impl<T> Default for OptionalArray<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> OptionalArray<T> {
    pub fn present(values: Vec<Option<T>>) -> Self {
        Self(Some(values))
    }

    pub fn absent() -> Self {
        Self(None)
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }
}

impl<T: Clone> OptionalArray<T> {
    /// Expand into exactly `len` entries.
    ///
    /// # Errors
    /// `Error::InvalidResults` if a present array has a different length.
    pub fn into_fixed(self, len: usize, name: &str) -> Result<Vec<Option<T>>> {
        match self.0 {
            None => Ok(vec![None; len]),
            Some(values) if values.len() == len => Ok(values),
            Some(values) => Err(Error::InvalidResults(format!(
                "'{}' has {} entries, expected {}",
                name,
                values.len(),
                len
            ))),
        }
    }
}

/// Serializable form of [`TemporalDetectionResults`](super::TemporalDetectionResults).
///
/// Labels are stored raw: an unmatched side is `null`, not the missing
/// placeholder, so a round trip reproduces the original match records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsDict {
    pub ytrue: Vec<Option<String>>,
    pub ypred: Vec<Option<String>>,
    pub ious: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "OptionalArray::is_absent")]
    pub confs: OptionalArray<f64>,
    #[serde(default, skip_serializing_if = "OptionalArray::is_absent")]
    pub ytrue_ids: OptionalArray<String>,
    #[serde(default, skip_serializing_if = "OptionalArray::is_absent")]
    pub ypred_ids: OptionalArray<String>,
    #[serde(default)]
    pub eval_key: Option<String>,
    #[serde(default)]
    pub gt_field: Option<String>,
    #[serde(default)]
    pub pred_field: Option<String>,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
    #[serde(default)]
    pub missing: Option<String>,
}

impl ResultsDict {
    /// Number of match records described.
    pub fn len(&self) -> usize {
        self.ytrue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ytrue.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the dictionary to a JSON file.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to create results file '{}': {}", path.as_ref().display(), e),
            ))
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a dictionary from a JSON file.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open results file '{}': {}", path.as_ref().display(), e),
            ))
        })?;

        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
