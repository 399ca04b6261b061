// Minefleet CLI - Fleet simulation and analytics driver
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Minefleet CLI
//!
//! Generate a seeded fleet dataset and run the analytics over it.
//!
//! ## Usage
//!
//! ```bash
//! # Simulate 8 machines for one day into data/simulated_readings.csv
//! minefleet generate --machines 8 --minutes 1440 --seed 42
//!
//! # Analyse an existing table
//! minefleet anomalies --input data/simulated_readings.csv --head 10
//! minefleet kpis --input data/simulated_readings.csv --json
//! minefleet predict --input data/simulated_readings.csv --test-fraction 0.25
//!
//! # Everything in one go
//! minefleet run --out-dir data
//! ```

mod commands;
mod report;

use clap::{Args, Parser, Subcommand};
use commands::{SimOverrides, DEFAULT_DATASET_PATH};
use minefleet::risk::RiskConfig;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Mining fleet telemetry simulator and analytics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a fleet and write the telemetry table
    Generate {
        #[command(flatten)]
        sim: SimArgs,

        /// Output CSV path
        #[arg(short, long, default_value = DEFAULT_DATASET_PATH)]
        out: PathBuf,
    },

    /// Detect rule-based anomalies
    Anomalies {
        /// Telemetry CSV to analyse
        #[arg(short, long)]
        input: PathBuf,

        /// Write all anomaly records to this CSV
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Number of records to print
        #[arg(long, default_value = "10")]
        head: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compute fleet and per-machine KPIs
    Kpis {
        /// Telemetry CSV to analyse
        #[arg(short, long)]
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Train and evaluate the failure-risk classifier
    Predict {
        /// Telemetry CSV to analyse
        #[arg(short, long)]
        input: PathBuf,

        /// Seed for the train/test split
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Fraction of each class held out for testing
        #[arg(long, default_value = "0.25")]
        test_fraction: f64,

        /// Print JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Generate, then run every analysis
    Run {
        #[command(flatten)]
        sim: SimArgs,

        #[command(flatten)]
        risk: RiskArgs,

        /// Directory for the generated artifacts
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SimArgs {
    /// JSON simulation config (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of machines (larger half AHS, rest drills)
    #[arg(short, long)]
    machines: Option<usize>,

    /// Minutes simulated per machine
    #[arg(long)]
    minutes: Option<usize>,

    /// Days simulated per machine (overridden by --minutes)
    #[arg(long)]
    days: Option<usize>,

    /// Simulation seed
    #[arg(short, long)]
    seed: Option<u64>,
}

impl From<SimArgs> for SimOverrides {
    fn from(args: SimArgs) -> Self {
        Self {
            config: args.config,
            machines: args.machines,
            minutes: args.minutes,
            days: args.days,
            seed: args.seed,
        }
    }
}

#[derive(Args, Debug)]
struct RiskArgs {
    /// Seed for the train/test split
    #[arg(long = "split-seed", default_value = "42")]
    split_seed: u64,

    /// Fraction of each class held out for testing
    #[arg(long, default_value = "0.25")]
    test_fraction: f64,
}

impl From<RiskArgs> for RiskConfig {
    fn from(args: RiskArgs) -> Self {
        RiskConfig::default()
            .with_seed(args.split_seed)
            .with_test_fraction(args.test_fraction)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match cli.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!("Minefleet v{}", minefleet::VERSION);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match cli.command {
        Command::Generate { sim, out: path } => {
            commands::generate(&sim.into(), &path, &mut out).map(|_| ())
        }
        Command::Anomalies {
            input,
            out: path,
            head,
            json,
        } => commands::anomalies(&input, path.as_deref(), head, json, &mut out),
        Command::Kpis { input, json } => commands::kpis(&input, json, &mut out),
        Command::Predict {
            input,
            seed,
            test_fraction,
            json,
        } => {
            let config = RiskConfig::default()
                .with_seed(seed)
                .with_test_fraction(test_fraction);
            commands::predict(&input, &config, json, &mut out)
        }
        Command::Run { sim, risk, out_dir } => {
            commands::run_all(&sim.into(), &out_dir, &risk.into(), &mut out)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["minefleet", "generate"]).unwrap();
        match cli.command {
            Command::Generate { sim, out } => {
                assert_eq!(out, PathBuf::from("data/simulated_readings.csv"));
                assert!(sim.machines.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "minefleet",
            "run",
            "--machines",
            "4",
            "--seed",
            "9",
            "--split-seed",
            "7",
            "--log-level",
            "debug",
        ])
        .unwrap();
        match cli.command {
            Command::Run { sim, risk, out_dir } => {
                assert_eq!(sim.machines, Some(4));
                assert_eq!(sim.seed, Some(9));
                let config: RiskConfig = risk.into();
                assert_eq!(config.seed, 7);
                assert_eq!(config.test_fraction, 0.25);
                assert_eq!(out_dir, PathBuf::from("data"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_input_required() {
        assert!(Cli::try_parse_from(["minefleet", "kpis"]).is_err());
    }
}
