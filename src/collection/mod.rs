//! Video collections consumed by the evaluator.
//!
//! This module provides:
//! - `SampleCollection` trait the evaluator reads videos through
//! - `Video` / `FieldValue` - one loaded video and its field values
//! - Schema types (`MediaType`, `LabelType`, `FieldKind`, `ErrorLevel`)
//! - `InMemoryDataset` - an in-memory collection

mod traits;
mod memory;

pub use traits::SampleCollection;
pub use memory::InMemoryDataset;

use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result, Segment};

/// Media type of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

/// Label type stored in a label field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelType {
    TemporalDetections,
    Detections,
    Classification,
}

impl LabelType {
    /// Name of the list attribute holding the individual labels, if the
    /// type is a list type.
    pub fn label_list_field(&self) -> Option<&'static str> {
        match self {
            LabelType::TemporalDetections | LabelType::Detections => Some("detections"),
            LabelType::Classification => None,
        }
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelType::TemporalDetections => write!(f, "TemporalDetections"),
            LabelType::Detections => write!(f, "Detections"),
            LabelType::Classification => write!(f, "Classification"),
        }
    }
}

/// Kind of a top-level field on the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Label(LabelType),
}

/// How to treat missing fields when deleting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorLevel {
    /// Fail with `Error::FieldNotFound`.
    Raise,
    /// Log a warning and continue.
    #[default]
    Warn,
    /// Continue silently.
    Ignore,
}

/// Value of one field on one video.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    TemporalDetections(Vec<Segment>),
}

/// One video and the field values loaded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Video {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Segments of a temporal detections field.
    ///
    /// A field with no value on this video has no segments.
    pub fn segments(&self, field: &str) -> Result<&[Segment]> {
        match self.fields.get(field) {
            None => Ok(&[]),
            Some(FieldValue::TemporalDetections(segments)) => Ok(segments),
            Some(FieldValue::Int(_)) => Err(Error::InvalidFieldType {
                field: field.to_string(),
                expected: LabelType::TemporalDetections.to_string(),
                got: "Int".to_string(),
            }),
        }
    }

    /// Mutable segments of a temporal detections field, if set.
    pub fn segments_mut(&mut self, field: &str) -> Option<&mut Vec<Segment>> {
        match self.fields.get_mut(field) {
            Some(FieldValue::TemporalDetections(segments)) => Some(segments),
            _ => None,
        }
    }

    pub fn set_segments(&mut self, field: impl Into<String>, segments: Vec<Segment>) {
        self.fields
            .insert(field.into(), FieldValue::TemporalDetections(segments));
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        match self.fields.get(field) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_int(&mut self, field: impl Into<String>, value: i64) {
        self.fields.insert(field.into(), FieldValue::Int(value));
    }
}
