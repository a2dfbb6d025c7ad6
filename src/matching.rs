//! Prediction-to-ground-truth assignment.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Check if a matrix contains NaN values.
pub fn has_nan(matrix: &DMatrix<f64>) -> bool {
    matrix.iter().any(|&x| x.is_nan())
}

/// Validate an IoU matrix (no NaN values allowed).
pub fn validate_iou_matrix(matrix: &DMatrix<f64>) -> Result<()> {
    if has_nan(matrix) {
        return Err(Error::InvalidSegment("IoU matrix contains NaN values".to_string()));
    }
    Ok(())
}

/// Greedily assign predictions to ground truth in priority order.
///
/// Predictions are visited in `order`. Each one takes the unmatched ground
/// truth with the greatest IoU among those with `iou >= threshold` and for
/// which `eligible(pred_idx, gt_idx)` holds. Ties go to the lower ground truth
/// index.
///
/// # Arguments
/// * `iou_matrix` - IoU matrix (n_predictions x n_ground_truth)
/// * `order` - Prediction indices in the order they should claim matches
/// * `threshold` - Minimum IoU for a valid match (inclusive)
/// * `eligible` - Extra pair filter, e.g. label equality
///
/// # Returns
/// Tuple of (matched_pred_indices, matched_gt_indices) where entry i indicates
/// the matched pair, in claim order.
pub fn match_in_order<F>(
    iou_matrix: &DMatrix<f64>,
    order: &[usize],
    threshold: f64,
    eligible: F,
) -> (Vec<usize>, Vec<usize>)
where
    F: Fn(usize, usize) -> bool,
{
    let n_preds = iou_matrix.nrows();
    let n_gts = iou_matrix.ncols();

    if n_preds == 0 || n_gts == 0 {
        return (Vec::new(), Vec::new());
    }

    let mut used_gts = vec![false; n_gts];

    let mut matched_preds = Vec::new();
    let mut matched_gts = Vec::new();

    for &pred_idx in order {
        let mut best: Option<(usize, f64)> = None;

        for gt_idx in 0..n_gts {
            if used_gts[gt_idx] || !eligible(pred_idx, gt_idx) {
                continue;
            }

            let iou = iou_matrix[(pred_idx, gt_idx)];
            if iou.is_nan() || iou < threshold {
                continue;
            }

            match best {
                Some((_, best_iou)) if iou <= best_iou => {}
                _ => best = Some((gt_idx, iou)),
            }
        }

        if let Some((gt_idx, _)) = best {
            used_gts[gt_idx] = true;
            matched_preds.push(pred_idx);
            matched_gts.push(gt_idx);
        }
    }

    (matched_preds, matched_gts)
}

/// Get unmatched indices from a match result.
pub fn get_unmatched(total: usize, matched: &[usize]) -> Vec<usize> {
    let mut is_matched = vec![false; total];
    for &idx in matched {
        is_matched[idx] = true;
    }
    (0..total).filter(|&i| !is_matched[i]).collect()
}
