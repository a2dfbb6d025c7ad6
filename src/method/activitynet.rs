//! ActivityNet-style temporal detection matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::traits::TemporalDetectionEvaluation;
use crate::iou::iou_matrix;
use crate::matching::{get_unmatched, match_in_order, validate_iou_matrix};
use crate::{Error, Match, Result, Segment};

/// Default IoU threshold for a match.
pub const DEFAULT_IOU: f64 = 0.5;

fn default_iou() -> f64 {
    DEFAULT_IOU
}

fn default_classwise() -> bool {
    true
}

/// Configuration for [`ActivityNetEvaluation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityNetEvaluationConfig {
    /// Field holding the predicted segments.
    pub pred_field: String,

    /// Field holding the ground truth segments.
    pub gt_field: String,

    /// Minimum IoU for a match (inclusive).
    #[serde(default = "default_iou")]
    pub iou: f64,

    /// Only match segments with equal labels.
    #[serde(default = "default_classwise")]
    pub classwise: bool,
}

impl ActivityNetEvaluationConfig {
    pub fn new(pred_field: impl Into<String>, gt_field: impl Into<String>) -> Self {
        Self {
            pred_field: pred_field.into(),
            gt_field: gt_field.into(),
            iou: DEFAULT_IOU,
            classwise: true,
        }
    }
}

/// Confidence-ordered greedy matching.
///
/// Within each label bucket (or one bucket when not classwise), predictions
/// claim ground truth in order of decreasing confidence; each takes the
/// unclaimed ground truth with the highest IoU at or above the threshold.
#[derive(Debug, Clone)]
pub struct ActivityNetEvaluation {
    config: ActivityNetEvaluationConfig,
}

impl ActivityNetEvaluation {
    pub fn new(config: ActivityNetEvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ActivityNetEvaluationConfig {
        &self.config
    }

    fn match_bucket(
        &self,
        ground_truth: &[&Segment],
        predictions: &[&Segment],
        out: &mut Vec<Match>,
    ) -> Result<()> {
        // Absent confidence sorts after every scored prediction
        let mut order: Vec<usize> = (0..predictions.len()).collect();
        order.sort_by(|&a, &b| {
            let conf_a = predictions[a].confidence().unwrap_or(-1.0);
            let conf_b = predictions[b].confidence().unwrap_or(-1.0);
            conf_b.total_cmp(&conf_a)
        });

        let ious = iou_matrix(predictions, ground_truth);
        validate_iou_matrix(&ious)?;

        let (matched_preds, matched_gts) =
            match_in_order(&ious, &order, self.config.iou, |_, _| true);

        let mut gt_for_pred = vec![None; predictions.len()];
        for (&p, &g) in matched_preds.iter().zip(&matched_gts) {
            gt_for_pred[p] = Some(g);
        }

        for &p in &order {
            let pred = predictions[p];
            let record = match gt_for_pred[p] {
                Some(g) => Match::matched(ground_truth[g], pred, ious[(p, g)])?,
                None => Match::unmatched_pred(pred)?,
            };
            out.push(record);
        }

        for g in get_unmatched(ground_truth.len(), &matched_gts) {
            out.push(Match::unmatched_gt(ground_truth[g])?);
        }

        Ok(())
    }
}

type Bucket<'a> = (Vec<&'a Segment>, Vec<&'a Segment>);

impl TemporalDetectionEvaluation for ActivityNetEvaluation {
    fn evaluate_video(
        &self,
        ground_truth: &[Segment],
        predictions: &[Segment],
    ) -> Result<Vec<Match>> {
        for segment in ground_truth.iter().chain(predictions) {
            if segment.label.is_none() {
                return Err(Error::InvalidSegment(format!(
                    "segment '{}' has no label",
                    segment.id
                )));
            }
        }

        let bucket_key = |s: &Segment| -> Option<String> {
            if self.config.classwise {
                s.label.clone()
            } else {
                None
            }
        };

        let mut buckets: BTreeMap<Option<String>, Bucket<'_>> = BTreeMap::new();
        for gt in ground_truth {
            buckets.entry(bucket_key(gt)).or_default().0.push(gt);
        }
        for pred in predictions {
            buckets.entry(bucket_key(pred)).or_default().1.push(pred);
        }

        let mut matches = Vec::with_capacity(ground_truth.len() + predictions.len());
        for (gts, preds) in buckets.values() {
            self.match_bucket(gts, preds, &mut matches)?;
        }

        Ok(matches)
    }
}
