// Minefleet - Anomaly rule engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Threshold-based anomaly detection.
//!
//! Every rule is evaluated independently on every row, so one reading can
//! raise several records. The overheating and low-pressure rules re-derive
//! the same predicates the generator uses for the stored flags; the two must
//! agree.

use crate::dataset::TIMESTAMP_FORMAT;
use crate::error::Result;
use crate::reading::{MachineType, Reading, OVERHEATING_THRESHOLD_C};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Drill vibration above which the bit or mounting is suspect (mm/s).
pub const DRILL_VIBRATION_THRESHOLD_MMS: f64 = 8.0;

/// Truck speed above which a light engine load is suspicious (km/h).
pub const SPEED_MISMATCH_THRESHOLD_KMH: f64 = 55.0;

/// Engine load below which a fast truck is suspicious (%).
pub const SPEED_MISMATCH_LOAD_PCT: f64 = 30.0;

/// Anomaly taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AnomalyKind {
    #[serde(rename = "Overheating")]
    Overheating,
    #[serde(rename = "Low Pressure")]
    LowPressure,
    #[serde(rename = "High Vibration")]
    HighVibration,
    #[serde(rename = "Speed/Load Mismatch")]
    SpeedLoadMismatch,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Overheating => "Overheating",
            AnomalyKind::LowPressure => "Low Pressure",
            AnomalyKind::HighVibration => "High Vibration",
            AnomalyKind::SpeedLoadMismatch => "Speed/Load Mismatch",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently an anomaly needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected anomaly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub timestamp: NaiveDateTime,
    pub machine_id: String,
    pub machine_type: MachineType,
    pub anomaly: AnomalyKind,
    /// Measurement that triggered the rule.
    pub value: f64,
    pub threshold: f64,
    pub severity: Severity,
    /// Maintenance action for this kind of anomaly.
    pub recommendation: &'static str,
}

/// A single threshold rule.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRule {
    pub kind: AnomalyKind,
    /// Machine type the rule is limited to (None = every type).
    pub machine_type: Option<MachineType>,
    pub threshold: f64,
    pub severity: Severity,
    pub recommendation: &'static str,
}

impl AnomalyRule {
    /// The triggering measurement, if the rule fires on this reading.
    pub fn evaluate(&self, reading: &Reading) -> Option<f64> {
        if let Some(machine_type) = self.machine_type {
            if reading.machine_type != machine_type {
                return None;
            }
        }

        let (value, fired) = match self.kind {
            AnomalyKind::Overheating => (reading.temp_c, reading.temp_c > self.threshold),
            AnomalyKind::LowPressure => (reading.pressure_bar, reading.pressure_bar < self.threshold),
            AnomalyKind::HighVibration => {
                (reading.vibration_mms, reading.vibration_mms > self.threshold)
            }
            AnomalyKind::SpeedLoadMismatch => (
                reading.speed_kmh,
                reading.speed_kmh > self.threshold
                    && reading.engine_load_pct < SPEED_MISMATCH_LOAD_PCT,
            ),
        };

        fired.then_some(value)
    }

    fn record(&self, reading: &Reading, value: f64) -> AnomalyRecord {
        AnomalyRecord {
            timestamp: reading.timestamp,
            machine_id: reading.machine_id.clone(),
            machine_type: reading.machine_type,
            anomaly: self.kind,
            value,
            threshold: self.threshold,
            severity: self.severity,
            recommendation: self.recommendation,
        }
    }
}

/// The fixed rule table, in per-row emission order.
pub fn default_rules() -> Vec<AnomalyRule> {
    vec![
        AnomalyRule {
            kind: AnomalyKind::Overheating,
            machine_type: None,
            threshold: OVERHEATING_THRESHOLD_C,
            severity: Severity::High,
            recommendation: "Schedule cooling & inspect coolant/filters",
        },
        AnomalyRule {
            kind: AnomalyKind::LowPressure,
            machine_type: Some(MachineType::Ahs),
            threshold: MachineType::Ahs.low_pressure_threshold(),
            severity: Severity::Medium,
            recommendation: "Check pump lines and pressure sensors",
        },
        AnomalyRule {
            kind: AnomalyKind::LowPressure,
            machine_type: Some(MachineType::Drill),
            threshold: MachineType::Drill.low_pressure_threshold(),
            severity: Severity::Medium,
            recommendation: "Inspect hydraulic system & seals",
        },
        AnomalyRule {
            kind: AnomalyKind::HighVibration,
            machine_type: Some(MachineType::Drill),
            threshold: DRILL_VIBRATION_THRESHOLD_MMS,
            severity: Severity::Medium,
            recommendation: "Check bit wear and mounting",
        },
        AnomalyRule {
            kind: AnomalyKind::SpeedLoadMismatch,
            machine_type: Some(MachineType::Ahs),
            threshold: SPEED_MISMATCH_THRESHOLD_KMH,
            severity: Severity::Low,
            recommendation: "Validate load sensor, review operation profile",
        },
    ]
}

/// Rule-based anomaly detector.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    rules: Vec<AnomalyRule>,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[AnomalyRule] {
        &self.rules
    }

    /// Records raised by a single reading, in rule order.
    pub fn evaluate(&self, reading: &Reading) -> Vec<AnomalyRecord> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(reading).map(|v| rule.record(reading, v)))
            .collect()
    }

    /// Scan every reading and return all records ordered by
    /// `(timestamp, machine_id)`.
    pub fn detect(&self, readings: &[Reading]) -> Vec<AnomalyRecord> {
        let mut records: Vec<AnomalyRecord> =
            readings.iter().flat_map(|r| self.evaluate(r)).collect();

        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.machine_id.cmp(&b.machine_id))
        });

        info!(
            rows = readings.len(),
            anomalies = records.len(),
            "anomaly detection pass complete"
        );
        records
    }
}

/// Detect anomalies with the default rule table.
pub fn detect(readings: &[Reading]) -> Vec<AnomalyRecord> {
    AnomalyDetector::default().detect(readings)
}

/// Counts over a detection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub total: usize,
    pub by_kind: BTreeMap<AnomalyKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_machine: BTreeMap<String, usize>,
}

impl AnomalySummary {
    pub fn from_records(records: &[AnomalyRecord]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.total += 1;
            *summary.by_kind.entry(record.anomaly).or_insert(0) += 1;
            *summary.by_severity.entry(record.severity).or_insert(0) += 1;
            *summary
                .by_machine
                .entry(record.machine_id.clone())
                .or_insert(0) += 1;
            summary
        })
    }
}

/// Write anomaly records as a CSV table.
pub fn write_anomalies_csv(path: impl AsRef<Path>, records: &[AnomalyRecord]) -> Result<()> {
    let file = File::create(path)?;
    write_anomalies(BufWriter::new(file), records)
}

/// Write anomaly records to any writer.
pub fn write_anomalies<W: Write>(writer: W, records: &[AnomalyRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "timestamp",
        "machine_id",
        "machine_type",
        "anomaly",
        "value",
        "threshold",
        "severity",
        "recommendation",
    ])?;

    for record in records {
        writer.write_record([
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.machine_id.clone(),
            record.machine_type.to_string(),
            record.anomaly.to_string(),
            record.value.to_string(),
            record.threshold.to_string(),
            record.severity.to_string(),
            record.recommendation.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
