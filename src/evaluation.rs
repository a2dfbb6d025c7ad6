//! Evaluation of temporal detections over a video collection.
//!
//! [`evaluate_temporal_detections`] runs an evaluation method on every video,
//! writes per-video tallies and per-segment annotations when an evaluation
//! key is given, and returns the aggregate [`TemporalDetectionResults`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::collection::{ErrorLevel, FieldKind, LabelType, MediaType, SampleCollection, Video};
use crate::method::{parse_config, EvaluationMethodConfig, TemporalDetectionEvaluation, DEFAULT_IOU};
use crate::runs::{RunInfo, RunRegistry};
use crate::{Error, Match, Result, Segment, TemporalDetectionResults};

/// Options for [`evaluate_temporal_detections`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Field holding the ground truth segments.
    pub gt_field: String,

    /// Key under which tallies, annotations and results are stored. Without
    /// a key the collection is left untouched.
    pub eval_key: Option<String>,

    /// Class list for the results; resolved from the collection when absent.
    pub classes: Option<Vec<String>>,

    /// Placeholder label for unmatched records.
    pub missing: Option<String>,

    /// Evaluation method name; the default method when absent.
    pub method: Option<String>,

    /// Minimum IoU for a match (inclusive).
    pub iou: f64,

    /// Only match segments with equal labels.
    pub classwise: bool,

    /// Extra method-specific options.
    pub options: Map<String, Value>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            gt_field: "ground_truth".to_string(),
            eval_key: None,
            classes: None,
            missing: None,
            method: None,
            iou: DEFAULT_IOU,
            classwise: true,
            options: Map::new(),
        }
    }
}

/// Evaluate the temporal detections in `pred_field` against `options.gt_field`.
///
/// # Arguments
/// * `samples` - Video collection to evaluate
/// * `runs` - Registry the run and its results are stored in
/// * `pred_field` - Field holding the predicted segments
/// * `options` - Evaluation options
///
/// # Returns
/// Results over all match records of all videos.
///
/// # Errors
/// Validation errors (`NotVideoCollection`, `FieldNotFound`,
/// `InvalidFieldType`, `UnsupportedMethod`, `InvalidConfig`, `FieldMismatch`)
/// are returned before anything is modified. Every video is matched before
/// the registry or the collection is written, so a failing video (e.g.
/// `InvalidSegment`) leaves a previous run under the same key intact.
pub fn evaluate_temporal_detections<C, R>(
    samples: &mut C,
    runs: &mut R,
    pred_field: &str,
    options: &EvaluationOptions,
) -> Result<TemporalDetectionResults>
where
    C: SampleCollection,
    R: RunRegistry,
{
    let gt_field = options.gt_field.as_str();

    validate_collection(samples, pred_field, gt_field)?;

    let classes = options
        .classes
        .clone()
        .or_else(|| samples.field_classes(pred_field))
        .or_else(|| samples.field_classes(gt_field))
        .or_else(|| samples.default_classes());

    let config = parse_config(
        pred_field,
        gt_field,
        options.method.as_deref(),
        options.iou,
        options.classwise,
        &options.options,
    )?;
    let method = config.build();

    let eval_key = options.eval_key.as_deref();
    if let Some(key) = eval_key {
        if let Some(existing) = runs.get_run_info(key) {
            validate_run(key, &existing.config, &config)?;
        }
    }

    let video_ids = samples.video_ids();
    info!(
        "Evaluating '{}' against '{}' on {} videos (method={}, iou={}, classwise={})",
        pred_field,
        gt_field,
        video_ids.len(),
        config.method(),
        config.iou(),
        config.classwise()
    );

    let label_fields = [pred_field, gt_field];
    let fields = if method.requires_additional_fields() {
        None
    } else {
        Some(&label_fields[..])
    };

    // Match every video before anything is written
    let mut evaluated = Vec::with_capacity(video_ids.len());
    for id in &video_ids {
        let video = samples.load_video(id, fields)?;
        let video_matches =
            method.evaluate_video(video.segments(gt_field)?, video.segments(pred_field)?)?;

        debug!("Video '{}': {} match records", id, video_matches.len());
        evaluated.push((video, video_matches));
    }

    if let Some(key) = eval_key {
        runs.register_run(RunInfo::new(key, config.clone()))?;

        let [tp_field, fp_field, fn_field] = tally_fields(key);
        for field in [&tp_field, &fp_field, &fn_field] {
            samples.add_field_if_necessary(field, FieldKind::Int)?;
        }

        for (video, video_matches) in &mut evaluated {
            let (tp, fp, fn_) = tally_matches(video_matches);
            debug!("Video '{}': tp={}, fp={}, fn={}", video.id, tp, fp, fn_);

            video.set_int(tp_field.as_str(), tp as i64);
            video.set_int(fp_field.as_str(), fp as i64);
            video.set_int(fn_field.as_str(), fn_ as i64);

            annotate_segments(video, key, &config, video_matches);
            samples.save_video(video)?;
        }
    }

    let matches = evaluated
        .into_iter()
        .flat_map(|(_, video_matches)| video_matches)
        .collect();

    let results = TemporalDetectionResults::new(
        matches,
        options.eval_key.clone(),
        Some(gt_field.to_string()),
        Some(pred_field.to_string()),
        classes,
        options.missing.clone(),
    );

    if let Some(key) = eval_key {
        runs.save_run_results(key, results.to_dict())?;
    }

    let (tp, fp, fn_) = results.counts();
    info!(
        "Evaluation complete: {} records, tp={}, fp={}, fn={}",
        results.len(),
        tp,
        fp,
        fn_
    );

    Ok(results)
}

fn validate_collection<C: SampleCollection>(
    samples: &C,
    pred_field: &str,
    gt_field: &str,
) -> Result<()> {
    let media_type = samples.media_type();
    if media_type != MediaType::Video {
        return Err(Error::NotVideoCollection(media_type.to_string()));
    }

    for field in [pred_field, gt_field] {
        let label_type = samples.label_field_type(field)?;
        if label_type != LabelType::TemporalDetections {
            return Err(Error::InvalidFieldType {
                field: field.to_string(),
                expected: LabelType::TemporalDetections.to_string(),
                got: label_type.to_string(),
            });
        }
    }

    Ok(())
}

/// A rerun under an existing key must evaluate the same fields.
fn validate_run(
    key: &str,
    existing: &EvaluationMethodConfig,
    requested: &EvaluationMethodConfig,
) -> Result<()> {
    let checks = [
        ("pred_field", existing.pred_field(), requested.pred_field()),
        ("gt_field", existing.gt_field(), requested.gt_field()),
    ];

    for (field, old, new) in checks {
        if old != new {
            return Err(Error::FieldMismatch {
                key: key.to_string(),
                field: field.to_string(),
                existing: old.to_string(),
                requested: new.to_string(),
            });
        }
    }

    Ok(())
}

fn tally_fields(key: &str) -> [String; 3] {
    [
        format!("{}_tp", key),
        format!("{}_fp", key),
        format!("{}_fn", key),
    ]
}

fn segment_fields(field: &str, list_field: &str, key: &str) -> [String; 3] {
    let base = format!("{}.{}.{}", field, list_field, key);
    [format!("{}_id", base), format!("{}_iou", base), base]
}

/// Count `(tp, fp, fn)` over match records.
///
/// An unmatched prediction is a false positive and an unmatched ground truth
/// a false negative. A matched pair with differing labels counts as both.
pub fn tally_matches(matches: &[Match]) -> (usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut fn_ = 0;

    for m in matches {
        match (m.gt_label(), m.pred_label()) {
            (None, _) => fp += 1,
            (_, None) => fn_ += 1,
            (Some(gt), Some(pred)) if gt != pred => {
                fp += 1;
                fn_ += 1;
            }
            _ => tp += 1,
        }
    }

    (tp, fp, fn_)
}

struct Annotation<'a> {
    tag: &'static str,
    counterpart: Option<(&'a str, f64)>,
}

fn annotate_segments(
    video: &mut Video,
    key: &str,
    config: &EvaluationMethodConfig,
    matches: &[Match],
) {
    let mut gt_annotations = HashMap::new();
    let mut pred_annotations = HashMap::new();

    for m in matches {
        let agree = m.is_matched() && m.gt_label() == m.pred_label();
        let pair = match (m.gt_id(), m.pred_id(), m.iou()) {
            (Some(gt_id), Some(pred_id), Some(iou)) if m.is_matched() => {
                Some((gt_id, pred_id, iou))
            }
            _ => None,
        };

        if let Some(gt_id) = m.gt_id() {
            gt_annotations.insert(
                gt_id,
                Annotation {
                    tag: if agree { "tp" } else { "fn" },
                    counterpart: pair.map(|(_, pred_id, iou)| (pred_id, iou)),
                },
            );
        }
        if let Some(pred_id) = m.pred_id() {
            pred_annotations.insert(
                pred_id,
                Annotation {
                    tag: if agree { "tp" } else { "fp" },
                    counterpart: pair.map(|(gt_id, _, iou)| (gt_id, iou)),
                },
            );
        }
    }

    if let Some(segments) = video.segments_mut(config.gt_field()) {
        apply_annotations(segments, key, &gt_annotations);
    }
    if let Some(segments) = video.segments_mut(config.pred_field()) {
        apply_annotations(segments, key, &pred_annotations);
    }
}

fn apply_annotations(
    segments: &mut [Segment],
    key: &str,
    annotations: &HashMap<&str, Annotation<'_>>,
) {
    let id_attr = format!("{}_id", key);
    let iou_attr = format!("{}_iou", key);

    for segment in segments {
        let Some(annotation) = annotations.get(segment.id.as_str()) else {
            continue;
        };

        segment.set_attribute(key, annotation.tag);
        match annotation.counterpart {
            Some((id, iou)) => {
                segment.set_attribute(id_attr.as_str(), id);
                segment.set_attribute(iou_attr.as_str(), iou);
            }
            None => {
                segment.attributes.remove(&id_attr);
                segment.attributes.remove(&iou_attr);
            }
        }
    }
}

/// Fields an evaluation writes onto a collection.
///
/// # Returns
/// The three tally fields followed by the `<key>_id`, `<key>_iou` and
/// `<key>` segment attributes of the prediction and ground truth fields.
pub fn evaluation_fields<C: SampleCollection>(
    samples: &C,
    key: &str,
    config: &EvaluationMethodConfig,
) -> Result<Vec<String>> {
    let mut fields: Vec<String> = tally_fields(key).into();

    for field in [config.pred_field(), config.gt_field()] {
        let label_type = samples.label_field_type(field)?;
        if let Some(list_field) = label_type.label_list_field() {
            fields.extend(segment_fields(field, list_field, key));
        }
    }

    Ok(fields)
}

/// Delete every field written by the evaluation under `key`.
///
/// Label fields no longer on the collection are skipped; any other missing
/// field is logged and ignored.
pub fn cleanup<C: SampleCollection>(
    samples: &mut C,
    key: &str,
    config: &EvaluationMethodConfig,
) -> Result<()> {
    let mut fields: Vec<String> = tally_fields(key).into();

    for field in [config.pred_field(), config.gt_field()] {
        let label_type = match samples.label_field_type(field) {
            Ok(label_type) => label_type,
            Err(Error::FieldNotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        if let Some(list_field) = label_type.label_list_field() {
            fields.extend(segment_fields(field, list_field, key));
        }
    }

    samples.delete_fields(&fields, ErrorLevel::Warn)
}

/// Remove the evaluation under `key` from the collection and the registry.
pub fn delete_evaluation<C, R>(samples: &mut C, runs: &mut R, key: &str) -> Result<()>
where
    C: SampleCollection,
    R: RunRegistry,
{
    let info = runs
        .get_run_info(key)
        .ok_or_else(|| Error::RunNotFound(key.to_string()))?;

    cleanup(samples, key, &info.config)?;
    runs.delete_run(key)?;

    info!("Deleted evaluation '{}'", key);
    Ok(())
}

/// Rebuild the results persisted under `key`.
pub fn load_evaluation_results<R: RunRegistry>(
    runs: &R,
    key: &str,
) -> Result<TemporalDetectionResults> {
    TemporalDetectionResults::from_dict(runs.load_run_results(key)?)
}
