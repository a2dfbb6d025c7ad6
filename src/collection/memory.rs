//! In-memory sample collection.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::traits::SampleCollection;
use super::{ErrorLevel, FieldKind, FieldValue, LabelType, MediaType, Video};
use crate::{Error, Result};

/// A sample collection held entirely in memory.
///
/// Keeps a schema of top-level fields plus, per temporal detections field,
/// the names of attributes that have been written onto its segments.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    media_type: MediaType,
    schema: BTreeMap<String, FieldKind>,
    segment_attributes: BTreeMap<String, BTreeSet<String>>,
    videos: Vec<Video>,
    classes: BTreeMap<String, Vec<String>>,
    default_classes: Vec<String>,
}

/// A resolved deletion target.
enum FieldPath {
    TopLevel(String),
    SegmentAttribute { field: String, attribute: String },
}

impl InMemoryDataset {
    /// Create an empty collection of the given media type.
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            schema: BTreeMap::new(),
            segment_attributes: BTreeMap::new(),
            videos: Vec::new(),
            classes: BTreeMap::new(),
            default_classes: Vec::new(),
        }
    }

    /// Create an empty video collection with two temporal detections fields.
    pub fn with_label_fields(gt_field: &str, pred_field: &str) -> Self {
        let mut dataset = Self::new(MediaType::Video);
        dataset.add_label_field(gt_field, LabelType::TemporalDetections);
        dataset.add_label_field(pred_field, LabelType::TemporalDetections);
        dataset
    }

    /// Declare a label field, replacing any previous declaration.
    pub fn add_label_field(&mut self, field: &str, label_type: LabelType) {
        self.schema
            .insert(field.to_string(), FieldKind::Label(label_type));
    }

    /// Append a video. Every field it carries must be declared.
    pub fn add_video(&mut self, video: Video) -> Result<()> {
        if self.videos.iter().any(|v| v.id == video.id) {
            return Err(Error::InvalidConfig(format!(
                "video '{}' already exists",
                video.id
            )));
        }
        self.check_fields(&video)?;
        self.record_segment_attributes(&video);
        self.videos.push(video);
        Ok(())
    }

    pub fn set_field_classes(&mut self, field: &str, classes: Vec<String>) {
        self.classes.insert(field.to_string(), classes);
    }

    pub fn set_default_classes(&mut self, classes: Vec<String>) {
        self.default_classes = classes;
    }

    /// Stored video by id.
    pub fn video(&self, id: &str) -> Option<&Video> {
        self.videos.iter().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Declared kind of a top-level field.
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.schema.get(field).copied()
    }

    /// Attribute names written onto the segments of a field.
    pub fn segment_attribute_names(&self, field: &str) -> Vec<String> {
        self.segment_attributes
            .get(field)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_fields(&self, video: &Video) -> Result<()> {
        for (name, value) in &video.fields {
            let kind = self
                .schema
                .get(name)
                .ok_or_else(|| Error::FieldNotFound(name.clone()))?;

            let compatible = matches!(
                (kind, value),
                (FieldKind::Int, FieldValue::Int(_))
                    | (
                        FieldKind::Label(LabelType::TemporalDetections),
                        FieldValue::TemporalDetections(_)
                    )
            );
            if !compatible {
                return Err(Error::InvalidFieldType {
                    field: name.clone(),
                    expected: format!("{:?}", kind),
                    got: match value {
                        FieldValue::Int(_) => "Int".to_string(),
                        FieldValue::TemporalDetections(_) => {
                            LabelType::TemporalDetections.to_string()
                        }
                    },
                });
            }
        }
        Ok(())
    }

    fn record_segment_attributes(&mut self, video: &Video) {
        for (name, value) in &video.fields {
            if let FieldValue::TemporalDetections(segments) = value {
                let names = self.segment_attributes.entry(name.clone()).or_default();
                for segment in segments {
                    names.extend(segment.attributes.keys().cloned());
                }
            }
        }
    }

    fn resolve_path(&self, path: &str) -> Option<FieldPath> {
        let parts: Vec<&str> = path.split('.').collect();
        match parts.as_slice() {
            [field] if self.schema.contains_key(*field) => {
                Some(FieldPath::TopLevel(field.to_string()))
            }
            [field, list, attribute] => {
                let FieldKind::Label(label_type) = self.schema.get(*field)? else {
                    return None;
                };
                if label_type.label_list_field() != Some(*list) {
                    return None;
                }
                let known = self
                    .segment_attributes
                    .get(*field)
                    .is_some_and(|names| names.contains(*attribute));
                known.then(|| FieldPath::SegmentAttribute {
                    field: field.to_string(),
                    attribute: attribute.to_string(),
                })
            }
            _ => None,
        }
    }
}

impl SampleCollection for InMemoryDataset {
    fn media_type(&self) -> MediaType {
        self.media_type
    }

    fn label_field_type(&self, field: &str) -> Result<LabelType> {
        match self.schema.get(field) {
            Some(FieldKind::Label(label_type)) => Ok(*label_type),
            Some(FieldKind::Int) => Err(Error::InvalidFieldType {
                field: field.to_string(),
                expected: "a label field".to_string(),
                got: "Int".to_string(),
            }),
            None => Err(Error::FieldNotFound(field.to_string())),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema.contains_key(field)
    }

    fn field_classes(&self, field: &str) -> Option<Vec<String>> {
        self.classes.get(field).cloned()
    }

    fn default_classes(&self) -> Option<Vec<String>> {
        if self.default_classes.is_empty() {
            None
        } else {
            Some(self.default_classes.clone())
        }
    }

    fn video_ids(&self) -> Vec<String> {
        self.videos.iter().map(|v| v.id.clone()).collect()
    }

    fn load_video(&self, id: &str, fields: Option<&[&str]>) -> Result<Video> {
        let mut video = self
            .video(id)
            .cloned()
            .ok_or_else(|| Error::VideoNotFound(id.to_string()))?;

        if let Some(fields) = fields {
            video.fields.retain(|name, _| fields.contains(&name.as_str()));
        }
        Ok(video)
    }

    fn save_video(&mut self, video: &Video) -> Result<()> {
        self.check_fields(video)?;

        let idx = self
            .videos
            .iter()
            .position(|v| v.id == video.id)
            .ok_or_else(|| Error::VideoNotFound(video.id.clone()))?;

        for (name, value) in &video.fields {
            self.videos[idx].fields.insert(name.clone(), value.clone());
        }
        self.record_segment_attributes(video);
        Ok(())
    }

    fn add_field_if_necessary(&mut self, field: &str, kind: FieldKind) -> Result<()> {
        match self.schema.get(field) {
            None => {
                self.schema.insert(field.to_string(), kind);
                Ok(())
            }
            Some(existing) if *existing == kind => Ok(()),
            Some(existing) => Err(Error::InvalidFieldType {
                field: field.to_string(),
                expected: format!("{:?}", kind),
                got: format!("{:?}", existing),
            }),
        }
    }

    fn delete_fields(&mut self, fields: &[String], error_level: ErrorLevel) -> Result<()> {
        let mut targets = Vec::with_capacity(fields.len());
        for path in fields {
            match self.resolve_path(path) {
                Some(target) => targets.push(target),
                None => match error_level {
                    ErrorLevel::Raise => return Err(Error::FieldNotFound(path.clone())),
                    ErrorLevel::Warn => warn!("Field '{}' does not exist; skipping", path),
                    ErrorLevel::Ignore => {}
                },
            }
        }

        for target in targets {
            match target {
                FieldPath::TopLevel(field) => {
                    self.schema.remove(&field);
                    self.segment_attributes.remove(&field);
                    for video in &mut self.videos {
                        video.fields.remove(&field);
                    }
                }
                FieldPath::SegmentAttribute { field, attribute } => {
                    if let Some(names) = self.segment_attributes.get_mut(&field) {
                        names.remove(&attribute);
                    }
                    for video in &mut self.videos {
                        if let Some(segments) = video.segments_mut(&field) {
                            for segment in segments {
                                segment.attributes.remove(&attribute);
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
