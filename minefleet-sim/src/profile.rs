// Minefleet Sim - Machine profiles
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-type channel presets and the status mix.

use crate::signal::SignalSpec;
use crate::spikes::SpikeConfig;
use minefleet::{MachineType, Status};
use rand::Rng;

/// Independent per-minute status distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusDistribution {
    cumulative: [(Status, f64); 4],
}

impl Default for StatusDistribution {
    /// Idle 15%, Operating 65%, Maintenance 10%, Downtime 10%.
    fn default() -> Self {
        Self::from_weights([
            (Status::Idle, 0.15),
            (Status::Operating, 0.65),
            (Status::Maintenance, 0.10),
            (Status::Downtime, 0.10),
        ])
    }
}

impl StatusDistribution {
    /// Build from relative weights (normalized to sum to 1).
    pub fn from_weights(weights: [(Status, f64); 4]) -> Self {
        let total: f64 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
        let mut running = 0.0;
        let cumulative = weights.map(|(status, w)| {
            running += if total > 0.0 { w.max(0.0) / total } else { 0.25 };
            (status, running)
        });
        Self { cumulative }
    }

    /// Draw one status from one uniform sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Status {
        let u: f64 = rng.gen();
        self.cumulative
            .iter()
            .find(|(_, edge)| u < *edge)
            .map(|(status, _)| *status)
            .unwrap_or(self.cumulative[3].0)
    }
}

/// Channel presets for one machine type.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineProfile {
    /// Speed channel (None = no speed sensor, no RNG draws).
    pub speed: Option<SignalSpec>,
    pub fuel: SignalSpec,
    pub temp: SignalSpec,
    pub vibration: SignalSpec,
    pub engine_load: SignalSpec,
    pub pressure: SignalSpec,
    /// Fuel multiplier outside `Operating`.
    pub non_operating_fuel_factor: f64,
    /// Temperature offset while in `Downtime` (°C).
    pub downtime_temp_offset: f64,
    pub operating_vibration_factor: f64,
    pub non_operating_vibration_factor: f64,
    pub spikes: SpikeConfig,
}

impl MachineProfile {
    /// Preset for a machine type.
    pub fn for_type(machine_type: MachineType) -> Self {
        match machine_type {
            MachineType::Ahs => Self::haul_truck(),
            MachineType::Drill => Self::drill(),
        }
    }

    /// Autonomous haul truck.
    pub fn haul_truck() -> Self {
        Self {
            speed: Some(SignalSpec::new(30.0, 8.0).with_bounds(0.0, 60.0)),
            fuel: SignalSpec::new(40.0, 5.0).with_lower(0.0),
            vibration: SignalSpec::new(3.0, 1.2).with_lower(0.0),
            pressure: SignalSpec::new(12.0, 2.0).with_lower(5.0),
            ..Self::common()
        }
    }

    /// Rotary drill.
    pub fn drill() -> Self {
        Self {
            speed: None,
            fuel: SignalSpec::new(15.0, 5.0).with_lower(0.0),
            vibration: SignalSpec::new(6.0, 1.2).with_lower(0.0),
            pressure: SignalSpec::new(20.0, 2.0).with_lower(5.0),
            ..Self::common()
        }
    }

    fn common() -> Self {
        Self {
            speed: None,
            fuel: SignalSpec::new(0.0, 0.0),
            temp: SignalSpec::new(75.0, 3.0)
                .with_drift(1.5)
                .with_bounds(50.0, 110.0),
            vibration: SignalSpec::new(0.0, 0.0),
            engine_load: SignalSpec::new(55.0, 10.0).with_bounds(0.0, 100.0),
            pressure: SignalSpec::new(0.0, 0.0),
            non_operating_fuel_factor: 0.25,
            downtime_temp_offset: -10.0,
            operating_vibration_factor: 1.2,
            non_operating_vibration_factor: 0.7,
            spikes: SpikeConfig::default(),
        }
    }
}
