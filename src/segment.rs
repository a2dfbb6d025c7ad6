//! Segment struct for ground truth and predicted temporal detections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// A labelled time span within one video.
///
/// Ground truth segments usually carry no confidence; predictions may carry
/// one in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentRecord")]
pub struct Segment {
    /// Identifier, unique within the owning video.
    pub id: String,

    /// Optional class label.
    pub label: Option<String>,

    /// `[start, end]` of the span.
    support: [f64; 2],

    /// Optional prediction confidence.
    confidence: Option<f64>,

    /// Free-form attributes, including per-evaluation annotations.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Segment {
    /// Create a new segment spanning `[start, end]`.
    ///
    /// # Arguments
    /// * `id` - Identifier unique within the video
    /// * `label` - Optional class label
    /// * `start` - Span start
    /// * `end` - Span end (must be `>= start`)
    pub fn new(
        id: impl Into<String>,
        label: Option<&str>,
        start: f64,
        end: f64,
    ) -> Result<Self> {
        let id = id.into();
        validate_support(&id, start, end)?;
        Ok(Self {
            id,
            label: label.map(str::to_string),
            support: [start, end],
            confidence: None,
            attributes: BTreeMap::new(),
        })
    }

    /// Attach a confidence score, consuming the segment.
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::InvalidSegment(format!(
                "segment '{}' has confidence {} outside [0, 1]",
                self.id, confidence
            )));
        }
        self.confidence = Some(confidence);
        Ok(self)
    }

    /// The `[start, end]` span.
    pub fn support(&self) -> [f64; 2] {
        self.support
    }

    pub fn start(&self) -> f64 {
        self.support[0]
    }

    pub fn end(&self) -> f64 {
        self.support[1]
    }

    /// Length of the span.
    pub fn duration(&self) -> f64 {
        self.support[1] - self.support[0]
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Look up an attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }
}

/// Unvalidated serialized form of a [`Segment`].
#[derive(Deserialize)]
struct SegmentRecord {
    id: String,
    label: Option<String>,
    support: [f64; 2],
    confidence: Option<f64>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl TryFrom<SegmentRecord> for Segment {
    type Error = Error;

    fn try_from(record: SegmentRecord) -> Result<Self> {
        let [start, end] = record.support;
        let mut segment = Segment::new(record.id, record.label.as_deref(), start, end)?;
        if let Some(confidence) = record.confidence {
            segment = segment.with_confidence(confidence)?;
        }
        segment.attributes = record.attributes;
        Ok(segment)
    }
}

fn validate_support(id: &str, start: f64, end: f64) -> Result<()> {
    if !start.is_finite() || !end.is_finite() {
        return Err(Error::InvalidSegment(format!(
            "segment '{}' has non-finite support [{}, {}]",
            id, start, end
        )));
    }
    if start > end {
        return Err(Error::InvalidSegment(format!(
            "segment '{}' starts after it ends: [{}, {}]",
            id, start, end
        )));
    }
    Ok(())
}
