// Minefleet Sim - Spike injection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sparse upward spikes on an already synthesized series.

use rand::seq::index;
use rand::Rng;

/// Spike density and magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeConfig {
    /// Fraction of samples that receive a spike (floored).
    pub rate: f64,
    /// Smallest bump (inclusive).
    pub min_bump: f64,
    /// Largest bump (exclusive).
    pub max_bump: f64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            rate: 0.01,
            min_bump: 8.0,
            max_bump: 15.0,
        }
    }
}

impl SpikeConfig {
    /// Number of spikes for a series of `length` samples.
    pub fn count(&self, length: usize) -> usize {
        ((length as f64 * self.rate).floor().max(0.0) as usize).min(length)
    }
}

/// Add spikes in place and return the spiked indices in selection order.
///
/// Indices are drawn without replacement first, then one uniform bump per
/// index, so the RNG sequence is indices then bumps.
pub fn inject_spikes<R: Rng + ?Sized>(
    rng: &mut R,
    series: &mut [f64],
    config: &SpikeConfig,
) -> Vec<usize> {
    let count = config.count(series.len());
    if count == 0 {
        return Vec::new();
    }

    let picked = index::sample(rng, series.len(), count).into_vec();
    for &i in &picked {
        let bump = if config.max_bump > config.min_bump {
            rng.gen_range(config.min_bump..config.max_bump)
        } else {
            config.min_bump
        };
        series[i] += bump;
    }
    picked
}
