//! Sample collection trait definition.

use super::{ErrorLevel, FieldKind, LabelType, MediaType, Video};
use crate::Result;

/// A collection of videos whose fields the evaluator reads and writes.
///
/// Implementations own storage and schema; the evaluator only goes through
/// this interface.
pub trait SampleCollection {
    /// Media type of the samples in the collection.
    fn media_type(&self) -> MediaType;

    /// Declared label type of a field.
    ///
    /// # Errors
    /// `Error::FieldNotFound` if the field is not on the schema.
    fn label_field_type(&self, field: &str) -> Result<LabelType>;

    /// Whether a top-level field is on the schema.
    fn has_field(&self, field: &str) -> bool;

    /// Known classes for one field, if any.
    fn field_classes(&self, _field: &str) -> Option<Vec<String>> {
        None
    }

    /// Collection-wide default classes, if any.
    fn default_classes(&self) -> Option<Vec<String>> {
        None
    }

    /// Ids of all videos, in iteration order.
    fn video_ids(&self) -> Vec<String>;

    /// Load one video.
    ///
    /// # Arguments
    /// * `id` - Video id
    /// * `fields` - When given, only these fields are loaded
    fn load_video(&self, id: &str, fields: Option<&[&str]>) -> Result<Video>;

    /// Persist the fields present on `video`.
    ///
    /// Fields absent from a narrowed video are left untouched.
    fn save_video(&mut self, video: &Video) -> Result<()>;

    /// Declare a top-level field unless it already exists.
    fn add_field_if_necessary(&mut self, field: &str, kind: FieldKind) -> Result<()>;

    /// Delete fields, each either top-level (`name`) or a segment attribute
    /// (`field.detections.attr`).
    ///
    /// Missing fields are handled according to `error_level`.
    fn delete_fields(&mut self, fields: &[String], error_level: ErrorLevel) -> Result<()>;
}
