// Minefleet Sim - Machine timeline generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Minute-by-minute telemetry for one machine.
//!
//! Channels are synthesized as whole series and then shaped by the status of
//! each minute. The RNG is consumed in a fixed order: statuses, speed (trucks
//! only), fuel, temperature, spike indices, spike bumps, vibration, engine
//! load, pressure. Changing that order changes every seeded dataset.

use crate::config::Machine;
use crate::profile::{MachineProfile, StatusDistribution};
use crate::signal::synthesize;
use crate::spikes::inject_spikes;
use chrono::{Duration, NaiveDateTime};
use minefleet::{Reading, Status};
use rand::Rng;

/// Generate `length` one-minute readings for `machine` starting at `start`.
pub fn generate_timeline<R: Rng + ?Sized>(
    rng: &mut R,
    machine: &Machine,
    start: NaiveDateTime,
    length: usize,
) -> Vec<Reading> {
    let profile = MachineProfile::for_type(machine.machine_type);
    generate_with_profile(rng, machine, &profile, start, length)
}

/// Same as [`generate_timeline`] with an explicit profile.
pub fn generate_with_profile<R: Rng + ?Sized>(
    rng: &mut R,
    machine: &Machine,
    profile: &MachineProfile,
    start: NaiveDateTime,
    length: usize,
) -> Vec<Reading> {
    let status_mix = StatusDistribution::default();
    let statuses: Vec<Status> = (0..length).map(|_| status_mix.sample(&mut *rng)).collect();

    let speed = match &profile.speed {
        Some(spec) => shape(synthesize(rng, length, spec), &statuses, |s, v| {
            if s.is_operating() {
                v
            } else {
                0.0
            }
        }),
        None => vec![0.0; length],
    };

    let fuel = shape(synthesize(rng, length, &profile.fuel), &statuses, |s, v| {
        if s.is_operating() {
            v
        } else {
            v * profile.non_operating_fuel_factor
        }
    });

    let mut temp = shape(synthesize(rng, length, &profile.temp), &statuses, |s, v| {
        if s == Status::Downtime {
            v + profile.downtime_temp_offset
        } else {
            v
        }
    });
    inject_spikes(rng, &mut temp, &profile.spikes);

    let vibration = shape(
        synthesize(rng, length, &profile.vibration),
        &statuses,
        |s, v| {
            if s.is_operating() {
                v * profile.operating_vibration_factor
            } else {
                v * profile.non_operating_vibration_factor
            }
        },
    );

    let engine_load = synthesize(rng, length, &profile.engine_load);
    let pressure = synthesize(rng, length, &profile.pressure);

    (0..length)
        .map(|i| {
            Reading::new(
                start + Duration::minutes(i as i64),
                &machine.id,
                machine.machine_type,
                statuses[i],
            )
            .with_speed(speed[i])
            .with_fuel(fuel[i])
            .with_temp(temp[i])
            .with_vibration(vibration[i])
            .with_engine_load(engine_load[i])
            .with_pressure(pressure[i])
            .with_derived_flags()
        })
        .collect()
}

fn shape(values: Vec<f64>, statuses: &[Status], f: impl Fn(Status, f64) -> f64) -> Vec<f64> {
    values
        .into_iter()
        .zip(statuses)
        .map(|(v, &s)| f(s, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalSpec;
    use crate::spikes::SpikeConfig;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use minefleet::MachineType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_length_and_spacing() {
        let mut rng = StdRng::seed_from_u64(42);
        let truck = Machine::new("AHS_01", MachineType::Ahs);
        let rows = generate_timeline(&mut rng, &truck, start(), 120);

        assert_eq!(rows.len(), 120);
        assert_eq!(rows[0].timestamp, start());
        assert_eq!(rows[119].timestamp, start() + Duration::minutes(119));
        assert!(rows.iter().all(|r| r.machine_id == "AHS_01"));
    }

    #[test]
    fn test_empty_timeline() {
        let mut rng = StdRng::seed_from_u64(42);
        let drill = Machine::new("Drill_01", MachineType::Drill);
        assert!(generate_timeline(&mut rng, &drill, start(), 0).is_empty());
    }

    #[test]
    fn test_truck_speed_follows_status() {
        let mut rng = StdRng::seed_from_u64(1);
        let truck = Machine::new("AHS_01", MachineType::Ahs);
        let rows = generate_timeline(&mut rng, &truck, start(), 1440);

        for r in &rows {
            assert!((0.0..=60.0).contains(&r.speed_kmh));
            if !r.status.is_operating() {
                assert_eq!(r.speed_kmh, 0.0);
            }
        }
        assert!(rows.iter().any(|r| r.speed_kmh > 0.0));
    }

    #[test]
    fn test_drill_has_no_speed() {
        let mut rng = StdRng::seed_from_u64(2);
        let drill = Machine::new("Drill_01", MachineType::Drill);
        let rows = generate_timeline(&mut rng, &drill, start(), 1440);
        assert!(rows.iter().all(|r| r.speed_kmh == 0.0));
    }

    #[test]
    fn test_channel_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for machine in [
            Machine::new("AHS_01", MachineType::Ahs),
            Machine::new("Drill_01", MachineType::Drill),
        ] {
            for r in generate_timeline(&mut rng, &machine, start(), 1440) {
                assert!(r.fuel_lph >= 0.0);
                assert!(r.vibration_mms >= 0.0);
                assert!((0.0..=100.0).contains(&r.engine_load_pct));
                assert!(r.pressure_bar >= 5.0);
                // Downtime offset and spikes can leave the synthesis bounds.
                assert!(r.temp_c >= 40.0 && r.temp_c < 125.0);
            }
        }
    }

    #[test]
    fn test_flags_match_predicates() {
        let mut rng = StdRng::seed_from_u64(4);
        let drill = Machine::new("Drill_02", MachineType::Drill);
        for r in generate_timeline(&mut rng, &drill, start(), 1440) {
            assert_eq!(r.flag_overheating, r.temp_c > 95.0);
            assert_eq!(r.flag_low_pressure, r.pressure_bar < 15.0);
        }
    }

    #[test]
    fn test_spikes_present_in_full_day() {
        let mut rng = StdRng::seed_from_u64(5);
        let truck = Machine::new("AHS_02", MachineType::Ahs);
        let rows = generate_timeline(&mut rng, &truck, start(), 1440);
        // 14 spikes of at least 8 degrees over a base near 75.
        assert!(rows.iter().filter(|r| r.temp_c > 84.0).count() >= 5);
    }

    #[test]
    fn test_same_seed_same_timeline() {
        let truck = Machine::new("AHS_01", MachineType::Ahs);
        let a = generate_timeline(&mut StdRng::seed_from_u64(8), &truck, start(), 300);
        let b = generate_timeline(&mut StdRng::seed_from_u64(8), &truck, start(), 300);
        assert_eq!(a, b);
    }

    /// Noise-free truck profile so every channel equals its base before shaping.
    fn flat_profile() -> MachineProfile {
        MachineProfile {
            speed: Some(SignalSpec::new(30.0, 0.0)),
            fuel: SignalSpec::new(40.0, 0.0),
            temp: SignalSpec::new(75.0, 0.0),
            vibration: SignalSpec::new(3.0, 0.0),
            engine_load: SignalSpec::new(55.0, 0.0),
            pressure: SignalSpec::new(12.0, 0.0),
            spikes: SpikeConfig {
                rate: 0.0,
                ..SpikeConfig::default()
            },
            ..MachineProfile::haul_truck()
        }
    }

    #[test]
    fn test_status_shaping_per_channel() {
        let mut rng = StdRng::seed_from_u64(11);
        let truck = Machine::new("AHS_01", MachineType::Ahs);
        let rows = generate_with_profile(&mut rng, &truck, &flat_profile(), start(), 500);

        let seen: HashSet<Status> = rows.iter().map(|r| r.status).collect();
        assert_eq!(seen.len(), 4);

        for r in &rows {
            match r.status {
                Status::Operating => {
                    assert_eq!(r.speed_kmh, 30.0);
                    assert_eq!(r.fuel_lph, 40.0);
                    assert_eq!(r.temp_c, 75.0);
                    assert_relative_eq!(r.vibration_mms, 3.6, epsilon = 1e-9);
                }
                Status::Downtime => {
                    assert_eq!(r.speed_kmh, 0.0);
                    assert_eq!(r.fuel_lph, 10.0);
                    assert_eq!(r.temp_c, 65.0);
                    assert_relative_eq!(r.vibration_mms, 2.1, epsilon = 1e-9);
                }
                Status::Idle | Status::Maintenance => {
                    assert_eq!(r.speed_kmh, 0.0);
                    assert_eq!(r.fuel_lph, 10.0);
                    assert_eq!(r.temp_c, 75.0);
                    assert_relative_eq!(r.vibration_mms, 2.1, epsilon = 1e-9);
                }
            }
            assert_eq!(r.engine_load_pct, 55.0);
            assert_eq!(r.pressure_bar, 12.0);
            assert!(!r.flag_overheating);
            assert!(!r.flag_low_pressure);
        }
    }

    #[test]
    fn test_spikes_follow_downtime_offset_and_precede_flags() {
        // Every minute spiked by exactly 30 on a temperature clamped to 80.
        let profile = MachineProfile {
            temp: SignalSpec::new(75.0, 0.0).with_bounds(50.0, 80.0),
            spikes: SpikeConfig {
                rate: 1.0,
                min_bump: 30.0,
                max_bump: 30.0,
            },
            ..flat_profile()
        };
        let mut rng = StdRng::seed_from_u64(12);
        let truck = Machine::new("AHS_01", MachineType::Ahs);
        let rows = generate_with_profile(&mut rng, &truck, &profile, start(), 400);

        assert!(rows.iter().any(|r| r.status == Status::Downtime));
        for r in &rows {
            if r.status == Status::Downtime {
                // 75 - 10 + 30 sits on the threshold, not above it.
                assert_eq!(r.temp_c, 95.0);
                assert!(!r.flag_overheating);
            } else {
                assert_eq!(r.temp_c, 105.0);
                assert!(r.flag_overheating);
            }
        }
    }
}
