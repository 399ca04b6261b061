// Minefleet Sim - Signal synthesizer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Noisy, drifting, bounded channel series.
//!
//! Each value is `base + noise + ramp`, where the noise is Gaussian and the
//! ramp rises linearly from 0 at the first sample to `drift` at the last.
//! Exactly one standard-normal draw is consumed per sample.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Parameters for one synthesized channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// Mean level.
    pub base: f64,
    /// Standard deviation of the Gaussian noise.
    pub noise_std: f64,
    /// Total rise of the linear ramp over the series.
    pub drift: f64,
    /// Lower clamp (None = unbounded).
    pub lower: Option<f64>,
    /// Upper clamp (None = unbounded).
    pub upper: Option<f64>,
}

impl SignalSpec {
    /// Create an unbounded spec without drift.
    pub fn new(base: f64, noise_std: f64) -> Self {
        Self {
            base,
            noise_std,
            drift: 0.0,
            lower: None,
            upper: None,
        }
    }

    /// Add a linear drift.
    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    /// Clamp to `[lower, upper]`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    /// Clamp from below only.
    pub fn with_lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    fn clamp(&self, value: f64) -> f64 {
        let value = self.lower.map_or(value, |lo| value.max(lo));
        self.upper.map_or(value, |hi| value.min(hi))
    }
}

/// Synthesize `length` samples for `spec`.
pub fn synthesize<R: Rng + ?Sized>(rng: &mut R, length: usize, spec: &SignalSpec) -> Vec<f64> {
    let step = if length > 1 {
        spec.drift / (length - 1) as f64
    } else {
        0.0
    };

    (0..length)
        .map(|i| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            spec.clamp(spec.base + z * spec.noise_std + step * i as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_length() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(synthesize(&mut rng, 0, &SignalSpec::new(10.0, 1.0)).is_empty());
    }

    #[test]
    fn test_drift_ramp_without_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        let series = synthesize(&mut rng, 4, &SignalSpec::new(10.0, 0.0).with_drift(1.5));
        let expected = [10.0, 10.5, 11.0, 11.5];
        for (got, want) in series.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_sample_has_no_drift() {
        let mut rng = StdRng::seed_from_u64(1);
        let series = synthesize(&mut rng, 1, &SignalSpec::new(5.0, 0.0).with_drift(3.0));
        assert_relative_eq!(series[0], 5.0);
    }

    #[test]
    fn test_bounds_respected() {
        let mut rng = StdRng::seed_from_u64(3);
        let spec = SignalSpec::new(30.0, 40.0).with_bounds(0.0, 60.0);
        let series = synthesize(&mut rng, 2000, &spec);
        assert!(series.iter().all(|v| (0.0..=60.0).contains(v)));
        assert!(series.iter().any(|&v| v == 0.0));
        assert!(series.iter().any(|&v| v == 60.0));
    }

    #[test]
    fn test_lower_bound_only() {
        let mut rng = StdRng::seed_from_u64(3);
        let spec = SignalSpec::new(1.0, 5.0).with_lower(0.0);
        let series = synthesize(&mut rng, 500, &spec);
        assert!(series.iter().all(|&v| v >= 0.0));
        assert!(series.iter().any(|&v| v > 6.0));
    }

    #[test]
    fn test_deterministic_and_one_draw_per_sample() {
        let spec = SignalSpec::new(75.0, 3.0);
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(synthesize(&mut a, 10, &spec), synthesize(&mut b, 10, &spec));

        let mut c = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let _: f64 = StandardNormal.sample(&mut c);
        }
        assert_eq!(a.gen::<u64>(), c.gen::<u64>());
    }

    #[test]
    fn test_noise_spread() {
        let mut rng = StdRng::seed_from_u64(11);
        let series = synthesize(&mut rng, 5000, &SignalSpec::new(0.0, 2.0));
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        let var = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / series.len() as f64;
        assert_relative_eq!(mean, 0.0, epsilon = 0.15);
        assert_relative_eq!(var.sqrt(), 2.0, epsilon = 0.15);
    }
}
