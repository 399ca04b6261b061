// Minefleet Sim - Simulation configuration
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulation configuration and machine manifest.
//!
//! A run is described by a [`SimulationConfig`]. The machines to simulate
//! come either from an explicit manifest or from the conventional default
//! fleet (`AHS_01..`, `Drill_01..`).

use chrono::{Duration, NaiveDate, NaiveDateTime};
use minefleet::{FleetError, MachineType, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Minutes in one simulated day.
pub const MINUTES_PER_DAY: usize = 1440;

/// One manifest line as written in a config file.
///
/// The machine type is kept as text so an unknown type surfaces as a
/// configuration error instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Unique machine identifier.
    pub machine_id: String,
    /// `AHS` or `Drill`.
    pub machine_type: String,
}

impl ManifestEntry {
    /// Create a new manifest entry.
    pub fn new(machine_id: &str, machine_type: &str) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            machine_type: machine_type.to_string(),
        }
    }
}

/// A validated machine to simulate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Machine {
    /// Unique machine identifier.
    pub id: String,
    /// Machine class.
    pub machine_type: MachineType,
}

impl Machine {
    /// Create a new machine.
    pub fn new(id: &str, machine_type: MachineType) -> Self {
        Self {
            id: id.to_string(),
            machine_type,
        }
    }
}

/// Simulation run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fleet size when no explicit manifest is given.
    pub machine_count: usize,
    /// Minutes simulated per machine.
    pub minutes: usize,
    /// Seed for the simulation RNG.
    pub seed: u64,
    /// Timestamp of the first row.
    pub start_time: NaiveDateTime,
    /// Explicit machine manifest (overrides `machine_count`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machines: Option<Vec<ManifestEntry>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            machine_count: 8,
            minutes: MINUTES_PER_DAY,
            seed: 42,
            start_time: default_start_time(),
            machines: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new simulation config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fleet size for the default manifest.
    pub fn with_machine_count(mut self, count: usize) -> Self {
        self.machine_count = count;
        self
    }

    /// Set minutes simulated per machine.
    pub fn with_minutes(mut self, minutes: usize) -> Self {
        self.minutes = minutes;
        self
    }

    /// Set duration in whole days.
    ///
    /// Saturates on overflow; [`SimulationConfig::total_rows`] rejects the result.
    pub fn with_days(mut self, days: usize) -> Self {
        self.minutes = days.saturating_mul(MINUTES_PER_DAY);
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set timestamp of the first row.
    pub fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Use an explicit machine manifest.
    pub fn with_machines(mut self, machines: Vec<ManifestEntry>) -> Self {
        self.machines = Some(machines);
        self
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Rows produced for `machine_count` machines.
    ///
    /// Fails when the last timestamp is not representable or the row count
    /// overflows `usize`.
    pub fn total_rows(&self, machine_count: usize) -> Result<usize> {
        let out_of_range = || {
            FleetError::configuration(format!(
                "{} minutes from {} is out of range",
                self.minutes, self.start_time
            ))
        };
        let minutes = i64::try_from(self.minutes)
            .ok()
            .filter(|m| *m <= i64::MAX / 60_000)
            .ok_or_else(out_of_range)?;
        self.start_time
            .checked_add_signed(Duration::minutes(minutes))
            .ok_or_else(out_of_range)?;

        machine_count.checked_mul(self.minutes).ok_or_else(|| {
            FleetError::configuration(format!(
                "{} machines x {} minutes overflows the row count",
                machine_count, self.minutes
            ))
        })
    }

    /// Validated machines in manifest order.
    pub fn resolve_manifest(&self) -> Result<Vec<Machine>> {
        let machines = match &self.machines {
            Some(entries) => entries
                .iter()
                .map(|e| Ok(Machine::new(&e.machine_id, e.machine_type.parse()?)))
                .collect::<Result<Vec<_>>>()?,
            None => default_manifest(self.machine_count),
        };

        if machines.is_empty() {
            return Err(FleetError::configuration("machine manifest is empty"));
        }

        let mut seen = HashSet::new();
        for machine in &machines {
            if machine.id.trim().is_empty() {
                return Err(FleetError::configuration("machine id must not be empty"));
            }
            if !seen.insert(machine.id.as_str()) {
                return Err(FleetError::configuration(format!(
                    "duplicate machine id '{}'",
                    machine.id
                )));
            }
        }

        Ok(machines)
    }
}

/// Conventional fleet: the larger half trucks, the rest drills.
pub fn default_manifest(machine_count: usize) -> Vec<Machine> {
    let drills = machine_count / 2;
    let trucks = machine_count - drills;

    let trucks = (1..=trucks).map(|i| Machine::new(&format!("AHS_{:02}", i), MachineType::Ahs));
    let drills =
        (1..=drills).map(|i| Machine::new(&format!("Drill_{:02}", i), MachineType::Drill));
    trucks.chain(drills).collect()
}

fn default_start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}
