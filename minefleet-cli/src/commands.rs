// Minefleet CLI - Subcommand implementations
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Subcommand bodies, writing their reports to any `io::Write`.

use crate::report;
use minefleet::anomaly::{self, write_anomalies_csv};
use minefleet::kpi::{self, FleetKpi, KpiRecord};
use minefleet::risk::{self, RiskConfig};
use minefleet::{Dataset, LogisticRegression, Result};
use minefleet_sim::{build_fleet, SimulationConfig};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default output of `generate`.
pub const DEFAULT_DATASET_PATH: &str = "data/simulated_readings.csv";

/// Flag overrides applied on top of a config file or the defaults.
#[derive(Debug, Clone, Default)]
pub struct SimOverrides {
    pub config: Option<PathBuf>,
    pub machines: Option<usize>,
    pub minutes: Option<usize>,
    pub days: Option<usize>,
    pub seed: Option<u64>,
}

impl SimOverrides {
    /// Resolve the effective simulation config.
    pub fn resolve(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(count) = self.machines {
            config = config.with_machine_count(count);
        }
        if let Some(days) = self.days {
            config = config.with_days(days);
        }
        if let Some(minutes) = self.minutes {
            config = config.with_minutes(minutes);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

/// Simulate a fleet and write it as CSV.
pub fn generate<W: Write>(overrides: &SimOverrides, out: &Path, w: &mut W) -> Result<Dataset> {
    let config = overrides.resolve()?;
    let dataset = build_fleet(&config)?;

    ensure_parent(out)?;
    dataset.write_csv(out)?;

    writeln!(
        w,
        "Wrote {} rows for {} machines to {}",
        dataset.len(),
        dataset.machine_ids().len(),
        out.display()
    )?;
    Ok(dataset)
}

/// Detect anomalies, optionally persist them, and print the head.
pub fn anomalies<W: Write>(
    input: &Path,
    out: Option<&Path>,
    head: usize,
    json: bool,
    w: &mut W,
) -> Result<()> {
    let dataset = Dataset::read_csv(input)?;
    let records = anomaly::detect(dataset.readings());

    if let Some(out) = out {
        ensure_parent(out)?;
        write_anomalies_csv(out, &records)?;
        info!(records = records.len(), path = %out.display(), "anomalies written");
    }

    if json {
        let head: Vec<_> = records.iter().take(head).collect();
        serde_json::to_writer_pretty(&mut *w, &AnomalyOutput {
            summary: anomaly::AnomalySummary::from_records(&records),
            head,
        })?;
        writeln!(w)?;
    } else {
        write!(w, "{}", report::AnomalyReport::new(&records, head))?;
    }
    Ok(())
}

/// Print fleet and per-machine KPIs.
pub fn kpis<W: Write>(input: &Path, json: bool, w: &mut W) -> Result<()> {
    let dataset = Dataset::read_csv(input)?;
    let fleet = kpi::fleet_wide(dataset.readings())?;
    let machines = kpi::per_machine(dataset.readings())?;

    if json {
        serde_json::to_writer_pretty(&mut *w, &KpiOutput {
            fleet: &fleet,
            machines: &machines,
        })?;
        writeln!(w)?;
    } else {
        write!(w, "{}", report::KpiReport::new(&fleet, &machines))?;
    }
    Ok(())
}

/// Train and score the failure-risk model.
pub fn predict<W: Write>(input: &Path, config: &RiskConfig, json: bool, w: &mut W) -> Result<()> {
    let dataset = Dataset::read_csv(input)?;
    let mut model = LogisticRegression::default();
    let eval = risk::evaluate(dataset.readings(), &mut model, config)?;

    if json {
        serde_json::to_writer_pretty(&mut *w, &eval)?;
        writeln!(w)?;
    } else {
        write!(w, "{}", report::PredictionReport(&eval))?;
    }
    Ok(())
}

/// Generate into `out_dir`, then run every analysis on the written table.
pub fn run_all<W: Write>(
    overrides: &SimOverrides,
    out_dir: &Path,
    risk_config: &RiskConfig,
    w: &mut W,
) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let dataset_path = out_dir.join("simulated_readings.csv");
    let anomalies_path = out_dir.join("anomalies.csv");

    generate(overrides, &dataset_path, w)?;
    writeln!(w)?;
    anomalies(&dataset_path, Some(&anomalies_path), 10, false, w)?;
    writeln!(w)?;
    kpis(&dataset_path, false, w)?;
    writeln!(w)?;
    predict(&dataset_path, risk_config, false, w)?;
    Ok(())
}

#[derive(Serialize)]
struct AnomalyOutput<'a> {
    summary: anomaly::AnomalySummary,
    head: Vec<&'a anomaly::AnomalyRecord>,
}

#[derive(Serialize)]
struct KpiOutput<'a> {
    fleet: &'a FleetKpi,
    machines: &'a [KpiRecord],
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
