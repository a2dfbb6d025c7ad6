//! Temporal detection evaluation results.
//!
//! This module provides:
//!
//! - `Match` - One matching outcome for a segment or a matched pair
//! - `TemporalDetectionResults` - Aggregate results of an evaluation run
//! - `ConfusionMatrix` - Ground truth vs. predicted label counts
//! - `Report` / `Metrics` - Per-class and aggregate precision/recall/F1
//! - `ResultsDict` - The persisted form of the results

mod matches;
mod confusion;
mod report;
mod dict;

pub use matches::Match;
pub use confusion::{ConfusionMatrix, OTHER_LABEL};
pub use report::{ClassMetrics, Metrics, Report};
pub use dict::{OptionalArray, ResultsDict};

use std::collections::BTreeSet;

use crate::evaluation::tally_matches;
use crate::Result;

/// Placeholder reported for the unmatched side of a record.
pub const DEFAULT_MISSING: &str = "(none)";

/// Results of a temporal detection evaluation.
///
/// Keeps the match records along with their parallel arrays, in record order. Labels are
/// kept raw; every label view substitutes [`missing`](Self::missing) for an
/// absent label.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalDetectionResults {
    matches: Vec<Match>,
    ytrue: Vec<Option<String>>,
    ypred: Vec<Option<String>>,
    ious: Vec<Option<f64>>,
    confs: Vec<Option<f64>>,
    ytrue_ids: Vec<Option<String>>,
    ypred_ids: Vec<Option<String>>,
    classes: Vec<String>,
    missing: String,
    eval_key: Option<String>,
    gt_field: Option<String>,
    pred_field: Option<String>,
}

impl TemporalDetectionResults {
    /// Build results from match records.
    ///
    /// # Arguments
    /// * `matches` - All match records of the run, in order
    /// * `eval_key` - Evaluation key, if the run was persisted
    /// * `gt_field` - Ground truth field name
    /// * `pred_field` - Predictions field name
    /// * `classes` - Class list; defaults to the sorted observed labels
    /// * `missing` - Placeholder for absent labels; defaults to `"(none)"`
    pub fn new(
        matches: Vec<Match>,
        eval_key: Option<String>,
        gt_field: Option<String>,
        pred_field: Option<String>,
        classes: Option<Vec<String>>,
        missing: Option<String>,
    ) -> Self {
        let n = matches.len();
        let mut ytrue = Vec::with_capacity(n);
        let mut ypred = Vec::with_capacity(n);
        let mut ious = Vec::with_capacity(n);
        let mut confs = Vec::with_capacity(n);
        let mut ytrue_ids = Vec::with_capacity(n);
        let mut ypred_ids = Vec::with_capacity(n);

        for m in &matches {
            ytrue.push(m.gt_label().map(str::to_string));
            ypred.push(m.pred_label().map(str::to_string));
            ious.push(m.iou());
            confs.push(m.pred_confidence());
            ytrue_ids.push(m.gt_id().map(str::to_string));
            ypred_ids.push(m.pred_id().map(str::to_string));
        }

        let missing = missing.unwrap_or_else(|| DEFAULT_MISSING.to_string());
        let classes = classes.unwrap_or_else(|| observed_classes(&ytrue, &ypred));

        Self {
            matches,
            ytrue,
            ypred,
            ious,
            confs,
            ytrue_ids,
            ypred_ids,
            classes,
            missing,
            eval_key,
            gt_field,
            pred_field,
        }
    }

    /// Rebuild results from their persisted form.
    ///
    /// # Errors
    /// `Error::InvalidResults` when array lengths disagree and
    /// `Error::MalformedMatch` when a record has neither label.
    pub fn from_dict(d: ResultsDict) -> Result<Self> {
        let n = d.ytrue.len();
        if d.ypred.len() != n || d.ious.len() != n {
            return Err(crate::Error::InvalidResults(format!(
                "ytrue, ypred and ious must have equal lengths, got {}, {} and {}",
                n,
                d.ypred.len(),
                d.ious.len()
            )));
        }

        let confs = d.confs.into_fixed(n, "confs")?;
        let ytrue_ids = d.ytrue_ids.into_fixed(n, "ytrue_ids")?;
        let ypred_ids = d.ypred_ids.into_fixed(n, "ypred_ids")?;

        let matches = d
            .ytrue
            .into_iter()
            .zip(d.ypred)
            .zip(d.ious)
            .zip(confs)
            .zip(ytrue_ids)
            .zip(ypred_ids)
            .map(|(((((gt, pred), iou), conf), gt_id), pred_id)| {
                Match::new(gt, pred, iou, conf, gt_id, pred_id)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            matches,
            d.eval_key,
            d.gt_field,
            d.pred_field,
            d.classes,
            d.missing,
        ))
    }

    /// Convert into the persisted form.
    pub fn to_dict(&self) -> ResultsDict {
        ResultsDict {
            ytrue: self.ytrue.clone(),
            ypred: self.ypred.clone(),
            ious: self.ious.clone(),
            confs: OptionalArray::present(self.confs.clone()),
            ytrue_ids: OptionalArray::present(self.ytrue_ids.clone()),
            ypred_ids: OptionalArray::present(self.ypred_ids.clone()),
            eval_key: self.eval_key.clone(),
            gt_field: self.gt_field.clone(),
            pred_field: self.pred_field.clone(),
            classes: Some(self.classes.clone()),
            missing: Some(self.missing.clone()),
        }
    }

    /// Number of match records.
    pub fn len(&self) -> usize {
        self.ytrue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ytrue.is_empty()
    }

    /// The match records, in order.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Raw ground truth labels, `None` for unmatched predictions.
    pub fn ytrue(&self) -> &[Option<String>] {
        &self.ytrue
    }

    /// Raw predicted labels, `None` for unmatched ground truth.
    pub fn ypred(&self) -> &[Option<String>] {
        &self.ypred
    }

    pub fn ious(&self) -> &[Option<f64>] {
        &self.ious
    }

    pub fn confs(&self) -> &[Option<f64>] {
        &self.confs
    }

    pub fn ytrue_ids(&self) -> &[Option<String>] {
        &self.ytrue_ids
    }

    pub fn ypred_ids(&self) -> &[Option<String>] {
        &self.ypred_ids
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn missing(&self) -> &str {
        &self.missing
    }

    pub fn eval_key(&self) -> Option<&str> {
        self.eval_key.as_deref()
    }

    pub fn gt_field(&self) -> Option<&str> {
        self.gt_field.as_deref()
    }

    pub fn pred_field(&self) -> Option<&str> {
        self.pred_field.as_deref()
    }

    /// Ground truth labels with absent labels replaced by the placeholder.
    pub fn ytrue_labels(&self) -> Vec<&str> {
        self.substituted(&self.ytrue)
    }

    /// Predicted labels with absent labels replaced by the placeholder.
    pub fn ypred_labels(&self) -> Vec<&str> {
        self.substituted(&self.ypred)
    }

    fn substituted<'a>(&'a self, labels: &'a [Option<String>]) -> Vec<&'a str> {
        labels
            .iter()
            .map(|l| l.as_deref().unwrap_or(self.missing.as_str()))
            .collect()
    }

    fn label_pairs(&self) -> Vec<(&str, &str)> {
        self.ytrue_labels()
            .into_iter()
            .zip(self.ypred_labels())
            .collect()
    }

    /// Total `(tp, fp, fn)` over all records.
    pub fn counts(&self) -> (usize, usize, usize) {
        tally_matches(&self.matches)
    }

    /// Confusion matrix over `classes` (default: the results' classes) plus
    /// the missing placeholder.
    pub fn confusion_matrix(
        &self,
        classes: Option<&[String]>,
        include_other: bool,
    ) -> ConfusionMatrix {
        let classes = classes.unwrap_or(&self.classes);
        ConfusionMatrix::from_pairs(self.label_pairs(), classes, &self.missing, include_other)
    }

    /// Per-class report over `classes` (default: the results' classes).
    pub fn report(&self, classes: Option<&[String]>) -> Report {
        let classes = classes.unwrap_or(&self.classes);
        report::build_report(&self.label_pairs(), classes)
    }

    /// Accuracy and micro-averaged precision/recall/F1 over the classes.
    pub fn metrics(&self) -> Metrics {
        report::build_metrics(&self.label_pairs(), &self.classes)
    }

    /// Segment ids behind one confusion matrix cell.
    ///
    /// Labels are compared after missing substitution, so
    /// `cell_ids("run", missing)` yields the unmatched "run" ground truth.
    ///
    /// # Returns
    /// `(gt_ids, pred_ids)` in record order.
    pub fn cell_ids(&self, gt_label: &str, pred_label: &str) -> (Vec<String>, Vec<String>) {
        let mut gt_ids = Vec::new();
        let mut pred_ids = Vec::new();

        for (i, (t, p)) in self.label_pairs().into_iter().enumerate() {
            if t != gt_label || p != pred_label {
                continue;
            }
            if let Some(id) = &self.ytrue_ids[i] {
                gt_ids.push(id.clone());
            }
            if let Some(id) = &self.ypred_ids[i] {
                pred_ids.push(id.clone());
            }
        }

        (gt_ids, pred_ids)
    }
}

fn observed_classes(ytrue: &[Option<String>], ypred: &[Option<String>]) -> Vec<String> {
    ytrue
        .iter()
        .chain(ypred)
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Segment};

    fn seg(id: &str, label: &str) -> Segment {
        Segment::new(id, Some(label), 0.0, 1.0).unwrap()
    }

    fn sample_matches() -> Vec<Match> {
        let g0 = seg("g0", "run");
        let g1 = seg("g1", "walk");
        let g2 = seg("g2", "run");
        let p0 = seg("p0", "run").with_confidence(0.9).unwrap();
        let p1 = seg("p1", "run").with_confidence(0.6).unwrap();
        let p2 = seg("p2", "jump").with_confidence(0.3).unwrap();

        vec![
            Match::matched(&g0, &p0, 0.8).unwrap(),
            Match::matched(&g1, &p1, 0.7).unwrap(),
            Match::unmatched_pred(&p2).unwrap(),
            Match::unmatched_gt(&g2).unwrap(),
        ]
    }

    fn sample_results() -> TemporalDetectionResults {
        TemporalDetectionResults::new(
            sample_matches(),
            Some("eval".into()),
            Some("ground_truth".into()),
            Some("predictions".into()),
            None,
            None,
        )
    }

    #[test]
    fn test_exploded_arrays_preserve_order() {
        let results = sample_results();

        assert_eq!(results.len(), 4);
        assert_eq!(results.ytrue_labels(), vec!["run", "walk", "(none)", "run"]);
        assert_eq!(results.ypred_labels(), vec!["run", "run", "jump", "(none)"]);
        assert_eq!(results.ious(), &[Some(0.8), Some(0.7), None, None]);
        assert_eq!(results.confs(), &[Some(0.9), Some(0.6), Some(0.3), None]);
        assert_eq!(results.ytrue_ids()[3].as_deref(), Some("g2"));
        assert_eq!(results.ypred_ids()[2].as_deref(), Some("p2"));
        assert_eq!(results.matches(), sample_matches());
    }

    #[test]
    fn test_default_classes_are_observed_labels() {
        let results = sample_results();
        assert_eq!(results.classes(), &["jump", "run", "walk"]);
        assert_eq!(results.missing(), DEFAULT_MISSING);
    }

    #[test]
    fn test_explicit_classes_and_missing() {
        let results = TemporalDetectionResults::new(
            sample_matches(),
            None,
            None,
            None,
            Some(vec!["run".into()]),
            Some("none".into()),
        );

        assert_eq!(results.classes(), &["run"]);
        assert_eq!(results.ytrue_labels()[2], "none");
    }

    #[test]
    fn test_empty_results() {
        let results = TemporalDetectionResults::new(Vec::new(), None, None, None, None, None);

        assert!(results.is_empty());
        assert!(results.classes().is_empty());
        assert_eq!(results.counts(), (0, 0, 0));
        assert_eq!(results.confusion_matrix(None, false).labels(), &["(none)"]);
    }

    #[test]
    fn test_counts_double_count_mismatch() {
        // tp: g0/p0; mismatch g1/p1 => fp+fn; p2 => fp; g2 => fn
        assert_eq!(sample_results().counts(), (1, 2, 2));
    }

    #[test]
    fn test_confusion_matrix() {
        let cm = sample_results().confusion_matrix(None, false);

        assert_eq!(cm.labels(), &["jump", "run", "walk", "(none)"]);
        assert_eq!(cm.get("run", "run"), 1);
        assert_eq!(cm.get("walk", "run"), 1);
        assert_eq!(cm.get("(none)", "jump"), 1);
        assert_eq!(cm.get("run", "(none)"), 1);
        assert_eq!(cm.total(), 4);
    }

    #[test]
    fn test_cell_ids() {
        let results = sample_results();

        let (gt_ids, pred_ids) = results.cell_ids("walk", "run");
        assert_eq!(gt_ids, vec!["g1"]);
        assert_eq!(pred_ids, vec!["p1"]);

        let (gt_ids, pred_ids) = results.cell_ids("run", "(none)");
        assert_eq!(gt_ids, vec!["g2"]);
        assert!(pred_ids.is_empty());
    }

    #[test]
    fn test_report_and_metrics() {
        let results = sample_results();
        let report = results.report(None);

        let run = report.class("run").unwrap();
        // run: tp=1, predicted=2, true=2
        assert!((run.precision - 0.5).abs() < 1e-10);
        assert!((run.recall - 0.5).abs() < 1e-10);

        let metrics = results.metrics();
        assert!((metrics.accuracy - 0.25).abs() < 1e-10);
        assert_eq!(metrics.support, 3);
    }

    #[test]
    fn test_dict_round_trip() {
        let results = sample_results();
        let restored = TemporalDetectionResults::from_dict(results.to_dict()).unwrap();

        assert_eq!(restored, results);
        assert_eq!(restored.matches(), results.matches());
    }

    #[test]
    fn test_json_round_trip() {
        let results = sample_results();
        let json = results.to_dict().to_json().unwrap();
        let restored =
            TemporalDetectionResults::from_dict(ResultsDict::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored, results);
    }

    #[test]
    fn test_from_dict_without_optional_arrays() {
        let d = ResultsDict {
            ytrue: vec![Some("run".into()), None],
            ypred: vec![None, Some("run".into())],
            ious: vec![None, None],
            ..Default::default()
        };

        let results = TemporalDetectionResults::from_dict(d).unwrap();
        assert_eq!(results.confs(), &[None, None]);
        assert_eq!(results.ytrue_ids(), &[None, None]);
        assert_eq!(results.ypred_ids(), &[None, None]);
        assert_eq!(results.classes(), &["run"]);
    }

    #[test]
    fn test_from_dict_rejects_unequal_lengths() {
        let d = ResultsDict {
            ytrue: vec![Some("run".into())],
            ypred: vec![],
            ious: vec![None],
            ..Default::default()
        };
        assert!(matches!(
            TemporalDetectionResults::from_dict(d),
            Err(Error::InvalidResults(_))
        ));
    }

    #[test]
    fn test_from_dict_rejects_label_free_record() {
        let d = ResultsDict {
            ytrue: vec![None],
            ypred: vec![None],
            ious: vec![None],
            ..Default::default()
        };
        assert!(matches!(
            TemporalDetectionResults::from_dict(d),
            Err(Error::MalformedMatch(_))
        ));
    }

    #[test]
    fn test_matches_keep_every_record() {
        let results = sample_results();
        assert_eq!(results.matches().len(), results.len());
        assert_eq!(results.matches()[3].gt_id(), Some("g2"));
    }

    #[test]
    fn test_label_free_record_in_json_is_rejected() {
        let json = r#"{"ytrue": ["run", null], "ypred": ["run", null], "ious": [0.9, null]}"#;
        let d = ResultsDict::from_json(json).unwrap();
        assert!(matches!(
            TemporalDetectionResults::from_dict(d),
            Err(Error::MalformedMatch(_))
        ));
    }
}
