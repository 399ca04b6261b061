// Minefleet Sim - Seeded fleet telemetry simulator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Minefleet Sim
//!
//! Seeded telemetry generator for mining fleets of autonomous haul trucks
//! (AHS) and drills.
//!
//! - **Signals**: Gaussian noise, linear drift and clamping per channel
//! - **Machine profiles**: per-type channel presets and the status mix
//! - **Spikes**: sparse temperature excursions
//! - **Fleet builder**: one seeded RNG over the whole manifest, sorted output
//!
//! ## Quick Start
//!
//! ```rust
//! use minefleet_sim::{build_fleet, SimulationConfig};
//!
//! let config = SimulationConfig::new()
//!     .with_machine_count(2)
//!     .with_minutes(60)
//!     .with_seed(42);
//!
//! let dataset = build_fleet(&config).unwrap();
//! assert_eq!(dataset.len(), 120);
//! assert!(dataset.is_sorted());
//! ```
//!
//! The same config always yields the same dataset, down to the bytes of its
//! CSV export.

pub mod builder;
pub mod config;
pub mod profile;
pub mod signal;
pub mod spikes;
pub mod timeline;

// Re-exports for convenience
pub use builder::{build_fleet, FleetBuilder};
pub use config::{default_manifest, Machine, ManifestEntry, SimulationConfig};
pub use profile::{MachineProfile, StatusDistribution};
pub use signal::{synthesize, SignalSpec};
pub use spikes::{inject_spikes, SpikeConfig};
pub use timeline::generate_timeline;
