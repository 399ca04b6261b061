// Minefleet CLI - Text reports
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Plain-text tables for the console.

use minefleet::anomaly::{AnomalyRecord, AnomalySummary};
use minefleet::kpi::{FleetKpi, KpiRecord};
use minefleet::risk::RiskEvaluation;
use minefleet::TIMESTAMP_FORMAT;
use std::fmt;

/// Count, per-kind summary and the first `head` records.
pub struct AnomalyReport<'a> {
    records: &'a [AnomalyRecord],
    head: usize,
}

impl<'a> AnomalyReport<'a> {
    pub fn new(records: &'a [AnomalyRecord], head: usize) -> Self {
        Self { records, head }
    }
}

impl fmt::Display for AnomalyReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = AnomalySummary::from_records(self.records);

        writeln!(f, "Detected anomalies: {}", summary.total)?;
        for (kind, count) in &summary.by_kind {
            writeln!(f, "  {:<20} {:>8}", kind.as_str(), count)?;
        }
        for (severity, count) in &summary.by_severity {
            writeln!(f, "  severity {:<11} {:>8}", severity.as_str(), count)?;
        }

        if self.records.is_empty() || self.head == 0 {
            return Ok(());
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:<19}  {:<10} {:<5} {:<19} {:>8} {:>9} {:<8} {}",
            "timestamp", "machine_id", "type", "anomaly", "value", "threshold", "severity", "recommendation"
        )?;
        for r in self.records.iter().take(self.head) {
            writeln!(
                f,
                "{:<19}  {:<10} {:<5} {:<19} {:>8.2} {:>9} {:<8} {}",
                r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                r.machine_id,
                r.machine_type.as_str(),
                r.anomaly.as_str(),
                r.value,
                r.threshold,
                r.severity.as_str(),
                r.recommendation
            )?;
        }
        Ok(())
    }
}

/// Fleet overview followed by the per-machine table.
pub struct KpiReport<'a> {
    fleet: &'a FleetKpi,
    machines: &'a [KpiRecord],
}

impl<'a> KpiReport<'a> {
    pub fn new(fleet: &'a FleetKpi, machines: &'a [KpiRecord]) -> Self {
        Self { fleet, machines }
    }
}

impl fmt::Display for KpiReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fleet = self.fleet;

        writeln!(f, "Fleet overview")?;
        writeln!(
            f,
            "  period             {} .. {}",
            fleet.time_range.0.format(TIMESTAMP_FORMAT),
            fleet.time_range.1.format(TIMESTAMP_FORMAT)
        )?;
        writeln!(f, "  machines           {}", fleet.machines)?;
        writeln!(f, "  rows               {}", fleet.rows)?;
        writeln!(f, "  utilization_pct    {:.2}", fleet.utilization_pct)?;
        writeln!(f, "  downtime_pct       {:.2}", fleet.downtime_pct)?;
        writeln!(f, "  maintenance_pct    {:.2}", fleet.maintenance_pct)?;
        writeln!(f, "  idle_pct           {:.2}", fleet.idle_pct)?;
        writeln!(f, "  overheating_events {}", fleet.overheating_events)?;
        writeln!(f, "  low_pressure_events {}", fleet.low_pressure_events)?;

        writeln!(f)?;
        writeln!(
            f,
            "{:<10} {:<5} {:>7} {:>7} {:>7} {:>7} {:>6} {:>6} {:>8} {:>8} {:>8}",
            "machine_id", "type", "util%", "down%", "maint%", "idle%", "overh", "lowp", "fuel", "speed", "temp"
        )?;
        for k in self.machines {
            writeln!(
                f,
                "{:<10} {:<5} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>6} {:>6} {:>8.2} {:>8.2} {:>8.2}",
                k.machine_id,
                k.machine_type.as_str(),
                k.utilization_pct,
                k.downtime_pct,
                k.maintenance_pct,
                k.idle_pct,
                k.overheating_events,
                k.low_pressure_events,
                k.avg_fuel_lph,
                k.avg_speed_kmh,
                k.avg_temp_c
            )?;
        }
        Ok(())
    }
}

/// Partition sizes, label balance and the classification report.
pub struct PredictionReport<'a>(pub &'a RiskEvaluation);

impl fmt::Display for PredictionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eval = self.0;
        writeln!(
            f,
            "Failure-risk model: {} train rows, {} test rows, {:.1}% at risk",
            eval.train_rows,
            eval.test_rows,
            eval.positive_rate * 100.0
        )?;
        writeln!(f)?;
        write!(f, "{}", eval.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minefleet::anomaly;
    use minefleet::kpi;
    use minefleet::{MachineType, Reading, Status};

    fn readings() -> Vec<Reading> {
        let ts = minefleet::dataset::parse_timestamp("2024-02-01 00:00:00").unwrap();
        vec![
            Reading::new(ts, "AHS_01", MachineType::Ahs, Status::Operating)
                .with_speed(60.0)
                .with_temp(100.0)
                .with_engine_load(20.0)
                .with_pressure(8.0)
                .with_derived_flags(),
            Reading::new(ts, "Drill_01", MachineType::Drill, Status::Idle)
                .with_temp(80.0)
                .with_vibration(9.0)
                .with_pressure(20.0)
                .with_derived_flags(),
        ]
    }

    #[test]
    fn test_anomaly_report_lists_head() {
        let records = anomaly::detect(&readings());
        let text = AnomalyReport::new(&records, 2).to_string();
        assert!(text.starts_with("Detected anomalies: 4"));
        assert!(text.contains("Overheating"));
        assert!(text.contains("Schedule cooling & inspect coolant/filters"));
        assert_eq!(text.lines().filter(|l| l.starts_with("2024-02-01")).count(), 2);
    }

    #[test]
    fn test_anomaly_report_empty() {
        let text = AnomalyReport::new(&[], 10).to_string();
        assert_eq!(text.trim(), "Detected anomalies: 0");
    }

    #[test]
    fn test_kpi_report_sections() {
        let rows = readings();
        let fleet = kpi::fleet_wide(&rows).unwrap();
        let machines = kpi::per_machine(&rows).unwrap();
        let text = KpiReport::new(&fleet, &machines).to_string();

        let overview = text.find("Fleet overview").unwrap();
        let table = text.find("machine_id").unwrap();
        assert!(overview < table);
        assert!(text.contains("utilization_pct    50.00"));
        assert!(text.contains("Drill_01"));
    }
}
