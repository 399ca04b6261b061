//! Classification metrics for the failure-risk model
//!
//! This module provides a confusion matrix and a per-class
//! precision / recall / F1 report over a held-out partition.

use serde::Serialize;
use std::fmt;

/// Binary confusion matrix (positive class = fail risk)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Create new empty matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction
    pub fn record(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.true_positives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_negatives += 1,
        }
    }

    /// Build from paired label slices (extra elements are ignored)
    pub fn from_labels(actual: &[bool], predicted: &[bool]) -> Self {
        let mut matrix = Self::new();
        for (a, p) in actual.iter().zip(predicted) {
            matrix.record(*a, *p);
        }
        matrix
    }

    /// Total predictions recorded
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// Fraction of correct predictions (0.0 - 1.0)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Metrics with `class` treated as the positive label
    pub fn class_metrics(&self, class: bool) -> ClassMetrics {
        let (tp, fp, fn_) = if class {
            (self.true_positives, self.false_positives, self.false_negatives)
        } else {
            (self.true_negatives, self.false_negatives, self.false_positives)
        };

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ClassMetrics {
            class,
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: bool,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of this class
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class report over a held-out partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub confusion: ConfusionMatrix,
    /// Class `false` (no risk) then class `true` (risk)
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Compute the report from true and predicted labels
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let confusion = ConfusionMatrix::from_labels(actual, predicted);
        let classes = [confusion.class_metrics(false), confusion.class_metrics(true)];
        let total = confusion.total();

        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / 2.0,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / 2.0,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / 2.0,
            support: total,
        };

        let weighted = |value: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|c| value(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        Self {
            confusion,
            classes,
            accuracy: confusion.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }

    /// Metrics for one class
    pub fn class(&self, class: bool) -> &ClassMetrics {
        &self.classes[usize::from(class)]
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                u8::from(c.class),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.3} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}
