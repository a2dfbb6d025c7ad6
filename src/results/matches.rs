//! Match records emitted by evaluation methods.

use serde::Serialize;

use crate::{Error, Result, Segment};

/// Outcome of matching for one ground truth segment, one prediction, or one
/// matched pair.
///
/// An unmatched ground truth has no prediction label; an unmatched prediction
/// has no ground truth label. A record with neither label is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    gt_label: Option<String>,
    pred_label: Option<String>,
    iou: Option<f64>,
    pred_confidence: Option<f64>,
    gt_id: Option<String>,
    pred_id: Option<String>,
}

impl Match {
    /// Create a match record from its six components.
    ///
    /// # Errors
    /// `Error::MalformedMatch` if both labels are absent.
    pub fn new(
        gt_label: Option<String>,
        pred_label: Option<String>,
        iou: Option<f64>,
        pred_confidence: Option<f64>,
        gt_id: Option<String>,
        pred_id: Option<String>,
    ) -> Result<Self> {
        if gt_label.is_none() && pred_label.is_none() {
            return Err(Error::MalformedMatch(format!(
                "record (gt_id={:?}, pred_id={:?}) has neither a gt nor a predicted label",
                gt_id, pred_id
            )));
        }

        Ok(Self {
            gt_label,
            pred_label,
            iou,
            pred_confidence,
            gt_id,
            pred_id,
        })
    }

    /// Record for a matched pair.
    pub fn matched(gt: &Segment, pred: &Segment, iou: f64) -> Result<Self> {
        Self::new(
            Some(required_label(gt)?),
            Some(required_label(pred)?),
            Some(iou),
            pred.confidence(),
            Some(gt.id.clone()),
            Some(pred.id.clone()),
        )
    }

    /// Record for a ground truth segment that no prediction matched.
    pub fn unmatched_gt(gt: &Segment) -> Result<Self> {
        Self::new(
            Some(required_label(gt)?),
            None,
            None,
            None,
            Some(gt.id.clone()),
            None,
        )
    }

    /// Record for a prediction that matched no ground truth.
    pub fn unmatched_pred(pred: &Segment) -> Result<Self> {
        Self::new(
            None,
            Some(required_label(pred)?),
            None,
            pred.confidence(),
            None,
            Some(pred.id.clone()),
        )
    }

    pub fn gt_label(&self) -> Option<&str> {
        self.gt_label.as_deref()
    }

    pub fn pred_label(&self) -> Option<&str> {
        self.pred_label.as_deref()
    }

    pub fn iou(&self) -> Option<f64> {
        self.iou
    }

    pub fn pred_confidence(&self) -> Option<f64> {
        self.pred_confidence
    }

    pub fn gt_id(&self) -> Option<&str> {
        self.gt_id.as_deref()
    }

    pub fn pred_id(&self) -> Option<&str> {
        self.pred_id.as_deref()
    }

    /// Whether both sides are present.
    pub fn is_matched(&self) -> bool {
        self.gt_label.is_some() && self.pred_label.is_some()
    }
}

fn required_label(segment: &Segment) -> Result<String> {
    segment.label.clone().ok_or_else(|| {
        Error::InvalidSegment(format!("segment '{}' has no label", segment.id))
    })
}
