// Minefleet - Dataset structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset structures and tabular I/O.
//!
//! A [`Dataset`] is the single source of truth every analytics component
//! reads from. On disk it is a CSV table with one column per [`Column`];
//! channel values are rounded to their presentation precision on write.

use crate::error::{FleetError, Result};
use crate::reading::{MachineType, Reading, Status};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Timestamp layout written to tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Table columns, in canonical header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    MachineId,
    MachineType,
    Status,
    SpeedKmh,
    FuelLph,
    TempC,
    VibrationMms,
    EngineLoadPct,
    PressureBar,
    FlagOverheating,
    FlagLowPressure,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Timestamp,
        Column::MachineId,
        Column::MachineType,
        Column::Status,
        Column::SpeedKmh,
        Column::FuelLph,
        Column::TempC,
        Column::VibrationMms,
        Column::EngineLoadPct,
        Column::PressureBar,
        Column::FlagOverheating,
        Column::FlagLowPressure,
    ];

    /// Header name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::MachineId => "machine_id",
            Column::MachineType => "machine_type",
            Column::Status => "status",
            Column::SpeedKmh => "speed_kmh",
            Column::FuelLph => "fuel_lph",
            Column::TempC => "temp_c",
            Column::VibrationMms => "vibration_mms",
            Column::EngineLoadPct => "engine_load_pct",
            Column::PressureBar => "pressure_bar",
            Column::FlagOverheating => "flag_overheating",
            Column::FlagLowPressure => "flag_low_pressure",
        }
    }
}

/// A fleet telemetry dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub readings: Vec<Reading>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing readings without reordering them.
    pub fn from_readings(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// Get all rows.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Get number of rows.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct machine ids, sorted.
    pub fn machine_ids(&self) -> Vec<&str> {
        self.readings
            .iter()
            .map(|r| r.machine_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest timestamp.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        time_range(&self.readings)
    }

    /// Stable sort by `(timestamp, machine_id)`.
    pub fn sort(&mut self) {
        self.readings.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.machine_id.cmp(&b.machine_id))
        });
    }

    /// Whether rows are ordered by `(timestamp, machine_id)`.
    pub fn is_sorted(&self) -> bool {
        self.readings.windows(2).all(|w| {
            (w[0].timestamp, w[0].machine_id.as_str()) <= (w[1].timestamp, w[1].machine_id.as_str())
        })
    }

    /// Export to CSV file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.to_writer(BufWriter::new(file))?;
        info!(rows = self.len(), path = %path.display(), "dataset written");
        Ok(())
    }

    /// Write the table to any writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(Column::ALL.iter().map(|c| c.as_str()))?;

        for reading in &self.readings {
            let r = reading.rounded();
            writer.write_record([
                r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                r.machine_id.clone(),
                r.machine_type.as_str().to_string(),
                r.status.code().to_string(),
                format_value(r.speed_kmh),
                format_value(r.fuel_lph),
                format_value(r.temp_c),
                format_value(r.vibration_mms),
                format_value(r.engine_load_pct),
                format_value(r.pressure_bar),
                format_flag(r.flag_overheating),
                format_flag(r.flag_low_pressure),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Import from CSV file.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        info!(rows = dataset.len(), path = %path.display(), "dataset loaded");
        Ok(dataset)
    }

    /// Read a table from any reader.
    ///
    /// Every column must be present (any order). A single malformed cell
    /// fails the whole read.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let positions: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim(), i))
            .collect();

        let missing: Vec<String> = Column::ALL
            .iter()
            .filter(|c| !positions.contains_key(c.as_str()))
            .map(|c| c.as_str().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FleetError::Schema { missing });
        }

        let index: HashMap<Column, usize> = Column::ALL
            .iter()
            .map(|c| (*c, positions[c.as_str()]))
            .collect();

        let mut readings = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let row = RowParser {
                record: &record,
                index: &index,
                line,
            };
            readings.push(row.parse()?);
        }

        debug!(rows = readings.len(), "parsed telemetry table");
        Ok(Self { readings })
    }

    /// Export to JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Import from JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let dataset = serde_json::from_reader(BufReader::new(file))?;
        Ok(dataset)
    }
}

impl From<Vec<Reading>> for Dataset {
    fn from(readings: Vec<Reading>) -> Self {
        Self::from_readings(readings)
    }
}

/// Earliest and latest timestamp of a row set.
pub fn time_range(readings: &[Reading]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let min = readings.iter().map(|r| r.timestamp).min()?;
    let max = readings.iter().map(|r| r.timestamp).max()?;
    Some((min, max))
}

/// Parse a table timestamp.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_PARSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn format_value(value: f64) -> String {
    // Avoid "-0.0" after rounding tiny negatives.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:?}", value)
}

fn format_flag(flag: bool) -> String {
    if flag { "1" } else { "0" }.to_string()
}

struct RowParser<'a> {
    record: &'a csv::StringRecord,
    index: &'a HashMap<Column, usize>,
    line: u64,
}

impl RowParser<'_> {
    fn parse(&self) -> Result<Reading> {
        let timestamp = self.field(Column::Timestamp, |s| {
            parse_timestamp(s).ok_or_else(|| "invalid timestamp".to_string())
        })?;
        let machine_id = self.field(Column::MachineId, |s| {
            if s.is_empty() {
                Err("empty machine id".to_string())
            } else {
                Ok(s.to_string())
            }
        })?;
        let machine_type = self.field(Column::MachineType, |s| {
            s.parse::<MachineType>().map_err(|_| format!("unknown machine type '{}'", s))
        })?;
        let status = self.field(Column::Status, |s| {
            s.parse::<u8>()
                .ok()
                .and_then(Status::from_code)
                .ok_or_else(|| format!("invalid status code '{}'", s))
        })?;

        Ok(Reading {
            timestamp,
            machine_id,
            machine_type,
            status,
            speed_kmh: self.number(Column::SpeedKmh)?,
            fuel_lph: self.number(Column::FuelLph)?,
            temp_c: self.number(Column::TempC)?,
            vibration_mms: self.number(Column::VibrationMms)?,
            engine_load_pct: self.number(Column::EngineLoadPct)?,
            pressure_bar: self.number(Column::PressureBar)?,
            flag_overheating: self.flag(Column::FlagOverheating)?,
            flag_low_pressure: self.flag(Column::FlagLowPressure)?,
        })
    }

    fn field<T>(
        &self,
        column: Column,
        parse: impl FnOnce(&str) -> std::result::Result<T, String>,
    ) -> Result<T> {
        let raw = self
            .record
            .get(self.index[&column])
            .map(str::trim)
            .unwrap_or("");
        parse(raw).map_err(|message| FleetError::Parse {
            line: self.line,
            column: column.as_str().to_string(),
            message,
        })
    }

    fn number(&self, column: Column) -> Result<f64> {
        self.field(column, |s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("invalid number '{}'", s))
        })
    }

    fn flag(&self, column: Column) -> Result<bool> {
        self.field(column, |s| match s {
            "1" | "true" | "True" => Ok(true),
            "0" | "false" | "False" => Ok(false),
            other => Err(format!("invalid flag '{}'", other)),
        })
    }
}
