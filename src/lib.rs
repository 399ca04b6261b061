//! # Minefleet - Mining fleet telemetry analytics
//!
//! Typed telemetry for a fleet of autonomous haul trucks (AHS) and drills,
//! with the analytics that run over it.
//!
//! ## Key Features
//!
//! - **Typed readings**: one [`Reading`] per machine-minute with precomputed flags
//! - **Anomaly rules**: fixed threshold table with severity and recommendation
//! - **KPIs**: utilization, downtime and maintenance ratios per machine and fleet-wide
//! - **Failure risk**: stratified evaluation of a pluggable binary classifier
//!
//! Synthetic datasets come from the companion `minefleet-sim` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use minefleet::{anomaly, kpi, MachineType, Reading, Status};
//! use chrono::NaiveDate;
//!
//! let ts = NaiveDate::from_ymd_opt(2024, 2, 1)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//!
//! let reading = Reading::new(ts, "AHS_01", MachineType::Ahs, Status::Operating)
//!     .with_speed(60.0)
//!     .with_temp(100.0)
//!     .with_engine_load(20.0)
//!     .with_pressure(8.0)
//!     .with_derived_flags();
//!
//! let records = anomaly::detect(std::slice::from_ref(&reading));
//! assert_eq!(records.len(), 3);
//!
//! let fleet = kpi::fleet_wide(&[reading]).unwrap();
//! assert_eq!(fleet.utilization_pct, 100.0);
//! ```
//!
//! ## Modules
//!
//! - [`reading`]: Machine types, status codes and the reading record
//! - [`dataset`]: Dataset container and CSV/JSON I/O
//! - [`anomaly`]: Rule-based anomaly detection
//! - [`kpi`]: Per-machine and fleet KPIs
//! - [`risk`]: Risk labels, features and evaluation
//! - [`classifier`]: Binary classifier trait and logistic regression
//! - [`metrics`]: Classification report

// Modules
pub mod anomaly;
pub mod classifier;
pub mod dataset;
pub mod error;
pub mod kpi;
pub mod metrics;
pub mod reading;
pub mod risk;

// Re-exports for convenient access
pub use anomaly::{AnomalyDetector, AnomalyKind, AnomalyRecord, AnomalyRule, AnomalySummary, Severity};
pub use classifier::{BinaryClassifier, LogisticConfig, LogisticRegression};
pub use dataset::{Column, Dataset, TIMESTAMP_FORMAT};
pub use error::{FleetError, Result};
pub use kpi::{FleetKpi, KpiRecord};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use reading::{MachineType, Reading, Status, OVERHEATING_THRESHOLD_C};
pub use risk::{FeatureVector, RiskConfig, RiskEvaluation, Split, FEATURE_NAMES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
