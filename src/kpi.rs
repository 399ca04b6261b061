// Minefleet - KPI aggregation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Utilization, downtime and maintenance KPIs per machine and fleet-wide.
//!
//! Event counts come from the flags stored on each reading, not from a fresh
//! rule evaluation.

use crate::dataset::time_range;
use crate::error::{FleetError, Result};
use crate::reading::{round_dp, MachineType, Reading, Status};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// KPIs for one machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRecord {
    pub machine_id: String,
    pub machine_type: MachineType,
    pub rows: usize,
    pub utilization_pct: f64,
    pub downtime_pct: f64,
    pub maintenance_pct: f64,
    pub idle_pct: f64,
    pub overheating_events: usize,
    pub low_pressure_events: usize,
    pub avg_fuel_lph: f64,
    pub avg_speed_kmh: f64,
    pub avg_temp_c: f64,
}

/// KPIs over the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetKpi {
    pub utilization_pct: f64,
    pub downtime_pct: f64,
    pub maintenance_pct: f64,
    pub idle_pct: f64,
    pub overheating_events: usize,
    pub low_pressure_events: usize,
    pub rows: usize,
    pub machines: usize,
    pub time_range: (NaiveDateTime, NaiveDateTime),
}

/// Running totals for a group of readings.
#[derive(Debug, Clone, Default)]
struct Accumulator {
    rows: usize,
    status_counts: [usize; 4],
    overheating_events: usize,
    low_pressure_events: usize,
    fuel_sum: f64,
    speed_sum: f64,
    temp_sum: f64,
}

impl Accumulator {
    fn add(&mut self, reading: &Reading) {
        self.rows += 1;
        self.status_counts[reading.status.code() as usize] += 1;
        self.overheating_events += usize::from(reading.flag_overheating);
        self.low_pressure_events += usize::from(reading.flag_low_pressure);
        self.fuel_sum += reading.fuel_lph;
        self.speed_sum += reading.speed_kmh;
        self.temp_sum += reading.temp_c;
    }

    /// Percentage of rows in `status`, rounded to 2 dp.
    fn pct(&self, status: Status) -> f64 {
        let count = self.status_counts[status.code() as usize];
        round_dp(100.0 * count as f64 / self.rows as f64, 2)
    }

    fn mean(&self, sum: f64) -> f64 {
        round_dp(sum / self.rows as f64, 2)
    }
}

/// Per-machine KPIs ordered by machine id.
pub fn per_machine(readings: &[Reading]) -> Result<Vec<KpiRecord>> {
    if readings.is_empty() {
        return Err(FleetError::EmptyDataset {
            operation: "per-machine KPI aggregation",
        });
    }

    let groups: BTreeMap<(&str, MachineType), Accumulator> =
        readings.iter().fold(BTreeMap::new(), |mut groups, r| {
            groups
                .entry((r.machine_id.as_str(), r.machine_type))
                .or_insert_with(Accumulator::default)
                .add(r);
            groups
        });

    let records: Vec<KpiRecord> = groups
        .into_iter()
        .map(|((machine_id, machine_type), acc)| KpiRecord {
            machine_id: machine_id.to_string(),
            machine_type,
            rows: acc.rows,
            utilization_pct: acc.pct(Status::Operating),
            downtime_pct: acc.pct(Status::Downtime),
            maintenance_pct: acc.pct(Status::Maintenance),
            idle_pct: acc.pct(Status::Idle),
            overheating_events: acc.overheating_events,
            low_pressure_events: acc.low_pressure_events,
            avg_fuel_lph: acc.mean(acc.fuel_sum),
            avg_speed_kmh: acc.mean(acc.speed_sum),
            avg_temp_c: acc.mean(acc.temp_sum),
        })
        .collect();

    info!(machines = records.len(), "per-machine KPIs computed");
    Ok(records)
}

/// Fleet-wide KPIs.
pub fn fleet_wide(readings: &[Reading]) -> Result<FleetKpi> {
    let empty = FleetError::EmptyDataset {
        operation: "fleet KPI aggregation",
    };
    let range = time_range(readings).ok_or(empty)?;

    let acc = readings.iter().fold(Accumulator::default(), |mut acc, r| {
        acc.add(r);
        acc
    });
    let machines = readings
        .iter()
        .map(|r| r.machine_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    info!(rows = acc.rows, machines, "fleet KPIs computed");
    Ok(FleetKpi {
        utilization_pct: acc.pct(Status::Operating),
        downtime_pct: acc.pct(Status::Downtime),
        maintenance_pct: acc.pct(Status::Maintenance),
        idle_pct: acc.pct(Status::Idle),
        overheating_events: acc.overheating_events,
        low_pressure_events: acc.low_pressure_events,
        rows: acc.rows,
        machines,
        time_range: range,
    })
}
