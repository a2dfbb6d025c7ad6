//! Confusion matrix over class labels.

use std::collections::HashMap;

use nalgebra::DMatrix;

/// Label used for observed labels outside the class list when requested.
pub const OTHER_LABEL: &str = "(other)";

/// Confusion counts between ground truth (rows) and predicted (columns) labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: DMatrix<usize>,
}

impl ConfusionMatrix {
    /// Tally label pairs into a matrix.
    ///
    /// # Arguments
    /// * `pairs` - `(ground_truth, predicted)` labels, with missing labels
    ///   already substituted
    /// * `classes` - Row/column labels, in order
    /// * `missing` - Missing placeholder, appended unless already a class
    /// * `include_other` - Whether labels outside `classes` are counted under
    ///   [`OTHER_LABEL`] rather than dropped
    pub fn from_pairs<'a, I>(
        pairs: I,
        classes: &[String],
        missing: &str,
        include_other: bool,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut labels: Vec<String> = classes.to_vec();
        if include_other && !labels.iter().any(|l| l == OTHER_LABEL) {
            labels.push(OTHER_LABEL.to_string());
        }
        if !labels.iter().any(|l| l == missing) {
            labels.push(missing.to_string());
        }

        let index: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let other_idx = if include_other { index.get(OTHER_LABEL).copied() } else { None };

        let lookup = |label: &str| index.get(label).copied().or(other_idx);

        let n = labels.len();
        let mut counts = DMatrix::zeros(n, n);
        for (gt, pred) in pairs {
            if let (Some(i), Some(j)) = (lookup(gt), lookup(pred)) {
                counts[(i, j)] += 1;
            }
        }

        Self { labels, counts }
    }

    /// Row/column labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw counts, rows are ground truth and columns are predictions.
    pub fn counts(&self) -> &DMatrix<usize> {
        &self.counts
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Count for one `(ground_truth, predicted)` cell, 0 for unknown labels.
    pub fn get(&self, gt_label: &str, pred_label: &str) -> usize {
        match (self.position(gt_label), self.position(pred_label)) {
            (Some(i), Some(j)) => self.counts[(i, j)],
            _ => 0,
        }
    }

    /// Total number of counted pairs.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of ground truth entries with the given label.
    pub fn row_total(&self, gt_label: &str) -> usize {
        self.position(gt_label)
            .map(|i| self.counts.row(i).iter().sum())
            .unwrap_or(0)
    }

    /// Number of predictions with the given label.
    pub fn column_total(&self, pred_label: &str) -> usize {
        self.position(pred_label)
            .map(|j| self.counts.column(j).iter().sum())
            .unwrap_or(0)
    }
}
