// Minefleet - Risk feature/label builder
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Failure-risk labels, feature vectors and held-out evaluation.
//!
//! A reading is at risk when either stored flag is set. Evaluation labels
//! every reading, builds a fixed seven-column feature vector, splits the rows
//! with a class-stratified shuffle, then fits and scores a
//! [`BinaryClassifier`] on the two partitions.

use crate::classifier::BinaryClassifier;
use crate::error::{FleetError, Result};
use crate::metrics::ClassificationReport;
use crate::reading::Reading;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Number of model features.
pub const FEATURE_COUNT: usize = 7;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "speed_kmh",
    "fuel_lph",
    "temp_c",
    "vibration_mms",
    "engine_load_pct",
    "pressure_bar",
    "status",
];

/// Model input for one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_reading(reading: &Reading) -> Self {
        FeatureVector([
            reading.speed_kmh,
            reading.fuel_lph,
            reading.temp_c,
            reading.vibration_mms,
            reading.engine_load_pct,
            reading.pressure_bar,
            f64::from(reading.status.code()),
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<&Reading> for FeatureVector {
    fn from(reading: &Reading) -> Self {
        FeatureVector::from_reading(reading)
    }
}

/// Binary failure-risk label.
pub fn fail_risk(reading: &Reading) -> bool {
    reading.fail_risk()
}

/// Labels for every reading, in input order.
pub fn labels(readings: &[Reading]) -> Vec<bool> {
    readings.iter().map(fail_risk).collect()
}

/// Feature vectors for every reading, in input order.
pub fn features(readings: &[Reading]) -> Vec<FeatureVector> {
    readings.iter().map(FeatureVector::from_reading).collect()
}

/// Row indices of a train/test partition, each list ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Class-stratified train/test split.
///
/// Each class is shuffled on its own (class `false` first) and
/// `round(n × test_fraction)` of its rows, clamped to `[1, n - 1]`, go to the
/// test partition. Every class needs at least two rows.
pub fn stratified_split<R: Rng + ?Sized>(
    labels: &[bool],
    test_fraction: f64,
    rng: &mut R,
) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(FleetError::configuration(format!(
            "test fraction must be within (0, 1), got {}",
            test_fraction
        )));
    }

    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [false, true] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();

        let count = indices.len();
        if count < 2 {
            return Err(FleetError::InsufficientData { class, count });
        }

        indices.shuffle(rng);
        let n_test = ((count as f64 * test_fraction).round() as usize).clamp(1, count - 1);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// Evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of each class held out for testing (default: 0.25)
    pub test_fraction: f64,
    /// Seed for the split shuffle (default: 42)
    pub seed: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.25,
            seed: 42,
        }
    }
}

impl RiskConfig {
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of one train/test evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct RiskEvaluation {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Share of readings labelled at risk (0.0 - 1.0)
    pub positive_rate: f64,
    pub report: ClassificationReport,
}

/// Label, featurize, split, fit and score.
pub fn evaluate<C: BinaryClassifier + ?Sized>(
    readings: &[Reading],
    classifier: &mut C,
    config: &RiskConfig,
) -> Result<RiskEvaluation> {
    if readings.is_empty() {
        return Err(FleetError::EmptyDataset {
            operation: "risk evaluation",
        });
    }

    let y = labels(readings);
    let x = features(readings);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let split = stratified_split(&y, config.test_fraction, &mut rng)?;

    let pick_x = |idx: &[usize]| idx.iter().map(|&i| x[i]).collect::<Vec<_>>();
    let pick_y = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<_>>();

    classifier.fit(&pick_x(&split.train), &pick_y(&split.train))?;
    let truth = pick_y(&split.test);
    let predicted = classifier.predict(&pick_x(&split.test));
    let report = ClassificationReport::from_predictions(&truth, &predicted);

    let positive_rate = y.iter().filter(|&&l| l).count() as f64 / y.len() as f64;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        accuracy = report.accuracy,
        "risk model evaluated"
    );

    Ok(RiskEvaluation {
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        positive_rate,
        report,
    })
}
