// Minefleet - Failure-risk classifier
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Binary classifiers for the failure-risk label
//!
//! The risk evaluation only needs `fit` and `predict`, so any model can be
//! plugged in through [`BinaryClassifier`]. [`LogisticRegression`] is the
//! shipped implementation.

use crate::error::{FleetError, Result};
use crate::risk::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Standard deviation under which a feature column counts as constant
const CONSTANT_COLUMN_EPSILON: f64 = 1e-12;

/// A trainable binary classifier
pub trait BinaryClassifier {
    /// Train on feature rows and their labels
    fn fit(&mut self, features: &[FeatureVector], labels: &[bool]) -> Result<()>;

    /// Predict one label per feature row
    fn predict(&self, features: &[FeatureVector]) -> Vec<bool>;
}

/// Configuration for [`LogisticRegression`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticConfig {
    /// Maximum gradient descent iterations (default: 500)
    pub max_iter: usize,
    /// Step size on standardized features (default: 0.5)
    pub learning_rate: f64,
    /// L2 penalty on the weights, not the bias (default: 1e-4)
    pub l2: f64,
    /// Stop once the gradient norm falls below this (default: 1e-6)
    pub tolerance: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            learning_rate: 0.5,
            l2: 1e-4,
            tolerance: 1e-6,
        }
    }
}

/// Logistic regression trained by batch gradient descent on log-loss
///
/// Features are standardized with the training mean and standard deviation
/// before fitting; the same transform is applied at prediction time.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: LogisticConfig,
    weights: DVector<f64>,
    bias: f64,
    means: [f64; FEATURE_COUNT],
    stds: [f64; FEATURE_COUNT],
    iterations: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticConfig::default())
    }
}

impl LogisticRegression {
    /// Create an untrained model (predicts `false` everywhere)
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            weights: DVector::zeros(FEATURE_COUNT),
            bias: 0.0,
            means: [0.0; FEATURE_COUNT],
            stds: [1.0; FEATURE_COUNT],
            iterations: 0,
        }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    /// Weights on the standardized features, in `FEATURE_NAMES` order
    pub fn weights(&self) -> &[f64] {
        self.weights.as_slice()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Iterations run by the last `fit`
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Probability of the positive class for each row
    pub fn predict_proba(&self, features: &[FeatureVector]) -> Vec<f64> {
        if features.is_empty() {
            return Vec::new();
        }
        let x = self.design_matrix(features);
        (&x * &self.weights)
            .add_scalar(self.bias)
            .map(sigmoid)
            .iter()
            .copied()
            .collect()
    }

    fn design_matrix(&self, features: &[FeatureVector]) -> DMatrix<f64> {
        DMatrix::from_fn(features.len(), FEATURE_COUNT, |i, j| {
            (features[i].0[j] - self.means[j]) / self.stds[j]
        })
    }

    fn standardize(&mut self, features: &[FeatureVector]) {
        let n = features.len() as f64;
        for j in 0..FEATURE_COUNT {
            let mean = features.iter().map(|f| f.0[j]).sum::<f64>() / n;
            let variance = features
                .iter()
                .map(|f| (f.0[j] - mean).powi(2))
                .sum::<f64>()
                / n;
            let std = variance.sqrt();

            self.means[j] = mean;
            self.stds[j] = if std < CONSTANT_COLUMN_EPSILON {
                warn!(feature = FEATURE_NAMES[j], "constant feature column");
                1.0
            } else {
                std
            };
        }
    }
}

impl BinaryClassifier for LogisticRegression {
    fn fit(&mut self, features: &[FeatureVector], labels: &[bool]) -> Result<()> {
        if features.is_empty() {
            return Err(FleetError::EmptyDataset {
                operation: "classifier training",
            });
        }
        if features.len() != labels.len() {
            return Err(FleetError::configuration(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }

        self.standardize(features);
        let x = self.design_matrix(features);
        let y = DVector::from_iterator(labels.len(), labels.iter().map(|&l| f64::from(u8::from(l))));
        let n = features.len() as f64;

        self.weights = DVector::zeros(FEATURE_COUNT);
        self.bias = 0.0;
        self.iterations = 0;

        for _ in 0..self.config.max_iter {
            let p = (&x * &self.weights).add_scalar(self.bias).map(sigmoid);
            let err = p - &y;

            let grad_w = x.tr_mul(&err) / n + &self.weights * self.config.l2;
            let grad_b = err.sum() / n;

            self.weights -= &grad_w * self.config.learning_rate;
            self.bias -= grad_b * self.config.learning_rate;
            self.iterations += 1;

            if grad_w.norm() + grad_b.abs() < self.config.tolerance {
                break;
            }
        }

        debug!(
            iterations = self.iterations,
            bias = self.bias,
            "logistic regression trained"
        );
        Ok(())
    }

    fn predict(&self, features: &[FeatureVector]) -> Vec<bool> {
        self.predict_proba(features)
            .into_iter()
            .map(|p| p > 0.5)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(temp: f64, pressure: f64) -> FeatureVector {
        FeatureVector([30.0, 40.0, temp, 3.0, 55.0, pressure, 1.0])
    }

    fn separable() -> (Vec<FeatureVector>, Vec<bool>) {
        let features: Vec<FeatureVector> = (0..40)
            .map(|i| row(60.0 + i as f64, 12.0 + (i % 3) as f64))
            .collect();
        let labels = features.iter().map(|f| f.0[2] > 90.0).collect();
        (features, labels)
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0) < 1e-10);
    }

    #[test]
    fn test_untrained_predicts_negative() {
        let model = LogisticRegression::default();
        assert_eq!(model.predict(&[row(100.0, 5.0)]), vec![false]);
        assert!(model.predict(&[]).is_empty());
    }

    #[test]
    fn test_learns_separable_threshold() {
        let (features, labels) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();

        let predicted = model.predict(&features);
        let correct = predicted
            .iter()
            .zip(&labels)
            .filter(|(p, l)| p == l)
            .count();
        assert!(correct >= 36, "only {} of 40 correct", correct);
        assert!(model.weights()[2] > 0.0);
        assert!(model.iterations() > 0);
    }

    #[test]
    fn test_probabilities_bounded() {
        let (features, labels) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();
        for p in model.predict_proba(&features) {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let mut model = LogisticRegression::default();
        assert!(matches!(
            model.fit(&[], &[]),
            Err(FleetError::EmptyDataset { .. })
        ));
        assert!(matches!(
            model.fit(&[row(70.0, 12.0)], &[true, false]),
            Err(FleetError::Configuration(_))
        ));
    }

    #[test]
    fn test_constant_columns_tolerated() {
        let features = vec![row(70.0, 12.0), row(100.0, 12.0), row(71.0, 12.0), row(99.0, 12.0)];
        let labels = vec![false, true, false, true];
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();
        assert!(model.weights().iter().all(|w| w.is_finite()));
        assert_eq!(model.predict(&features), labels);
    }
}
