// Minefleet - Telemetry data model
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Telemetry data model.
//!
//! One [`Reading`] is one minute of one machine. The two boolean flags are
//! precomputed from threshold predicates and must always agree with the
//! anomaly rules in [`crate::anomaly`].

use crate::error::FleetError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Temperature above which a reading is overheating (°C).
pub const OVERHEATING_THRESHOLD_C: f64 = 95.0;

/// Machine class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MachineType {
    /// Autonomous haul truck.
    #[serde(rename = "AHS")]
    Ahs,
    /// Rotary drill.
    #[serde(rename = "Drill")]
    Drill,
}

impl MachineType {
    /// Label used in tables and machine ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::Ahs => "AHS",
            MachineType::Drill => "Drill",
        }
    }

    /// Pressure below which the low-pressure flag is raised (bar).
    pub fn low_pressure_threshold(&self) -> f64 {
        match self {
            MachineType::Ahs => 10.0,
            MachineType::Drill => 15.0,
        }
    }

    /// Whether the machine has a speed channel.
    pub fn has_speed(&self) -> bool {
        matches!(self, MachineType::Ahs)
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineType {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "AHS" => Ok(MachineType::Ahs),
            "Drill" => Ok(MachineType::Drill),
            other => Err(FleetError::configuration(format!(
                "unknown machine type '{}' (expected AHS or Drill)",
                other
            ))),
        }
    }
}

/// Operating state for one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Idle,
    Operating,
    Maintenance,
    Downtime,
}

impl Status {
    /// All states, in code order.
    pub const ALL: [Status; 4] = [
        Status::Idle,
        Status::Operating,
        Status::Maintenance,
        Status::Downtime,
    ];

    /// Integer code stored in tables.
    pub fn code(&self) -> u8 {
        match self {
            Status::Idle => 0,
            Status::Operating => 1,
            Status::Maintenance => 2,
            Status::Downtime => 3,
        }
    }

    /// Decode an integer code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Status::Idle),
            1 => Some(Status::Operating),
            2 => Some(Status::Maintenance),
            3 => Some(Status::Downtime),
            _ => None,
        }
    }

    pub fn is_operating(&self) -> bool {
        matches!(self, Status::Operating)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Status::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid status code {}", code)))
    }
}

/// One minute of telemetry for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub machine_id: String,
    pub machine_type: MachineType,
    pub status: Status,
    /// Ground speed (km/h). Always 0 for drills.
    pub speed_kmh: f64,
    /// Fuel rate (L/h).
    pub fuel_lph: f64,
    /// Engine temperature (°C).
    pub temp_c: f64,
    /// Vibration velocity (mm/s).
    pub vibration_mms: f64,
    /// Engine load (%).
    pub engine_load_pct: f64,
    /// Hydraulic pressure (bar).
    pub pressure_bar: f64,
    pub flag_overheating: bool,
    pub flag_low_pressure: bool,
}

impl Reading {
    /// Create a reading with all channels at zero and flags cleared.
    pub fn new(
        timestamp: NaiveDateTime,
        machine_id: &str,
        machine_type: MachineType,
        status: Status,
    ) -> Self {
        Self {
            timestamp,
            machine_id: machine_id.to_string(),
            machine_type,
            status,
            speed_kmh: 0.0,
            fuel_lph: 0.0,
            temp_c: 0.0,
            vibration_mms: 0.0,
            engine_load_pct: 0.0,
            pressure_bar: 0.0,
            flag_overheating: false,
            flag_low_pressure: false,
        }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    pub fn with_fuel(mut self, fuel_lph: f64) -> Self {
        self.fuel_lph = fuel_lph;
        self
    }

    pub fn with_temp(mut self, temp_c: f64) -> Self {
        self.temp_c = temp_c;
        self
    }

    pub fn with_vibration(mut self, vibration_mms: f64) -> Self {
        self.vibration_mms = vibration_mms;
        self
    }

    pub fn with_engine_load(mut self, engine_load_pct: f64) -> Self {
        self.engine_load_pct = engine_load_pct;
        self
    }

    pub fn with_pressure(mut self, pressure_bar: f64) -> Self {
        self.pressure_bar = pressure_bar;
        self
    }

    /// Recompute both flags from the current channel values.
    pub fn with_derived_flags(mut self) -> Self {
        self.derive_flags();
        self
    }

    /// Recompute both flags from the current channel values.
    pub fn derive_flags(&mut self) {
        self.flag_overheating = is_overheating(self.temp_c);
        self.flag_low_pressure = is_low_pressure(self.machine_type, self.pressure_bar);
    }

    /// True when either flag is set.
    pub fn fail_risk(&self) -> bool {
        self.flag_overheating || self.flag_low_pressure
    }

    /// Copy with every channel rounded to its table precision.
    pub fn rounded(&self) -> Self {
        Self {
            speed_kmh: round_dp(self.speed_kmh, 2),
            fuel_lph: round_dp(self.fuel_lph, 2),
            temp_c: round_dp(self.temp_c, 2),
            vibration_mms: round_dp(self.vibration_mms, 2),
            engine_load_pct: round_dp(self.engine_load_pct, 1),
            pressure_bar: round_dp(self.pressure_bar, 2),
            ..self.clone()
        }
    }
}

/// Overheating predicate used when flags are derived.
pub fn is_overheating(temp_c: f64) -> bool {
    temp_c > OVERHEATING_THRESHOLD_C
}

/// Low-pressure predicate used when flags are derived.
pub fn is_low_pressure(machine_type: MachineType, pressure_bar: f64) -> bool {
    pressure_bar < machine_type.low_pressure_threshold()
}

/// Round half away from zero to `decimals` places.
///
/// Exact ties go away from zero (`f64::round`), not to the even neighbour.
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
