//! IoU (Intersection over Union) computation for temporal segments.

use nalgebra::DMatrix;

use crate::Segment;

/// Compute the IoU between two `[start, end]` spans.
///
/// Spans are treated as continuous intervals. Two zero-length spans have an
/// IoU of 0.
pub fn segment_iou(a: [f64; 2], b: [f64; 2]) -> f64 {
    let inter = (a[1].min(b[1]) - a[0].max(b[0])).max(0.0);
    let union = (a[1] - a[0]) + (b[1] - b[0]) - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

/// Compute the IoU matrix between predictions and ground truth segments.
///
/// # Arguments
/// * `predictions` - Predicted segments, n rows
/// * `ground_truth` - Ground truth segments, m columns
///
/// # Returns
/// IoU matrix of shape (n, m). Entry (i, j) is the IoU between prediction i
/// and ground truth j.
pub fn iou_matrix(predictions: &[&Segment], ground_truth: &[&Segment]) -> DMatrix<f64> {
    let n = predictions.len();
    let m = ground_truth.len();

    DMatrix::from_fn(n, m, |i, j| {
        segment_iou(predictions[i].support(), ground_truth[j].support())
    })
}
