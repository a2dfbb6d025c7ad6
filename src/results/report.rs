//! Per-class and aggregate classification metrics.

use std::fmt;

/// Precision, recall and F1 for one class or one average.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of ground truth entries with this label.
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(tp: usize, pred_count: usize, true_count: usize) -> Self {
        let precision = ratio(tp, pred_count);
        let recall = ratio(tp, true_count);
        Self {
            precision,
            recall,
            f1: f1(precision, recall),
            support: true_count,
        }
    }
}

/// Aggregate metrics over all classes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    /// Fraction of records whose ground truth and predicted labels agree.
    pub accuracy: f64,
    /// Micro-averaged precision over the class list.
    pub precision: f64,
    /// Micro-averaged recall over the class list.
    pub recall: f64,
    /// Micro-averaged F1 over the class list.
    pub fscore: f64,
    /// Ground truth entries whose label is in the class list.
    pub support: usize,
}

/// Classification report with one row per class and three averages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub classes: Vec<(String, ClassMetrics)>,
    pub micro_avg: ClassMetrics,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl Report {
    /// Metrics for one class.
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, metrics)| metrics)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Build a report over `labels` from substituted label pairs.
pub(crate) fn build_report(pairs: &[(&str, &str)], labels: &[String]) -> Report {
    let mut classes = Vec::with_capacity(labels.len());
    let (mut tp_sum, mut pred_sum, mut true_sum) = (0, 0, 0);

    for label in labels {
        let label = label.as_str();
        let tp = pairs.iter().filter(|(t, p)| *t == label && *p == label).count();
        let pred_count = pairs.iter().filter(|(_, p)| *p == label).count();
        let true_count = pairs.iter().filter(|(t, _)| *t == label).count();

        tp_sum += tp;
        pred_sum += pred_count;
        true_sum += true_count;

        classes.push((label.to_string(), ClassMetrics::from_counts(tp, pred_count, true_count)));
    }

    let micro_avg = ClassMetrics::from_counts(tp_sum, pred_sum, true_sum);

    let n = classes.len();
    let macro_avg = if n > 0 {
        let mean = |f: fn(&ClassMetrics) -> f64| {
            classes.iter().map(|(_, m)| f(m)).sum::<f64>() / n as f64
        };
        ClassMetrics {
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1: mean(|m| m.f1),
            support: true_sum,
        }
    } else {
        ClassMetrics::default()
    };

    let weighted_avg = if true_sum > 0 {
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|(_, m)| f(m) * m.support as f64)
                .sum::<f64>()
                / true_sum as f64
        };
        ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: true_sum,
        }
    } else {
        ClassMetrics::default()
    };

    Report {
        classes,
        micro_avg,
        macro_avg,
        weighted_avg,
    }
}

/// Accuracy plus micro-averaged metrics over `labels`.
pub(crate) fn build_metrics(pairs: &[(&str, &str)], labels: &[String]) -> Metrics {
    let correct = pairs.iter().filter(|(t, p)| t == p).count();
    let micro = build_report(pairs, labels).micro_avg;

    Metrics {
        accuracy: ratio(correct, pairs.len()),
        precision: micro.precision,
        recall: micro.recall,
        fscore: micro.f1,
        support: micro.support,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|(name, _)| name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )
        };

        for (name, metrics) in &self.classes {
            row(f, name, metrics)?;
        }
        writeln!(f)?;
        row(f, "micro avg", &self.micro_avg)?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}
