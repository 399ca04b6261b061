// Minefleet Sim - Fleet dataset builder
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Whole-fleet dataset assembly.
//!
//! One `StdRng` seeded from the config drives every machine in manifest
//! order. The concatenated rows are then stable-sorted by
//! `(timestamp, machine_id)`.

use crate::config::SimulationConfig;
use crate::timeline::generate_timeline;
use minefleet::{Dataset, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// Builds a [`Dataset`] from a [`SimulationConfig`].
#[derive(Debug, Clone)]
pub struct FleetBuilder {
    config: SimulationConfig,
}

impl FleetBuilder {
    /// Create a new builder.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Configuration used by [`FleetBuilder::build`].
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generate the dataset.
    pub fn build(&self) -> Result<Dataset> {
        let machines = self.config.resolve_manifest()?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let rows = self.config.total_rows(machines.len())?;

        let mut readings = Vec::with_capacity(rows);
        for machine in &machines {
            let timeline =
                generate_timeline(&mut rng, machine, self.config.start_time, self.config.minutes);
            debug!(
                machine_id = %machine.id,
                machine_type = %machine.machine_type,
                rows = timeline.len(),
                "machine timeline generated"
            );
            readings.extend(timeline);
        }

        let mut dataset = Dataset::from_readings(readings);
        dataset.sort();

        info!(
            machines = machines.len(),
            rows = dataset.len(),
            seed = self.config.seed,
            "fleet dataset built"
        );
        Ok(dataset)
    }
}

/// Generate a fleet dataset for `config`.
pub fn build_fleet(config: &SimulationConfig) -> Result<Dataset> {
    FleetBuilder::new(config.clone()).build()
}
