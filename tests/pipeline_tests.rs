//! End-to-end checks over telemetry tables
//!
//! Tables are written as CSV text, loaded through the dataset reader and then
//! pushed through detection, KPI aggregation and risk evaluation.

use minefleet::anomaly::{self, AnomalyKind, Severity};
use minefleet::risk::{self, RiskConfig};
use minefleet::*;
use std::io::Cursor;
use tempfile::tempdir;

const HEADER: &str = "timestamp,machine_id,machine_type,status,speed_kmh,fuel_lph,temp_c,vibration_mms,engine_load_pct,pressure_bar,flag_overheating,flag_low_pressure";

fn table(rows: &[&str]) -> Dataset {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    Dataset::from_reader(Cursor::new(text)).unwrap()
}

#[test]
fn truck_with_three_faults() {
    let dataset = table(&["2024-02-01 00:00:00,AHS_01,AHS,1,60.0,40.0,100.0,3.0,20.0,8.0,1,1"]);
    let records = anomaly::detect(dataset.readings());

    let kinds: Vec<AnomalyKind> = records.iter().map(|r| r.anomaly).collect();
    assert_eq!(
        kinds,
        vec![
            AnomalyKind::Overheating,
            AnomalyKind::LowPressure,
            AnomalyKind::SpeedLoadMismatch
        ]
    );
    assert_eq!(records[0].severity, Severity::High);
    assert_eq!(records[1].threshold, 10.0);
    assert_eq!(records[2].severity, Severity::Low);
}

#[test]
fn drill_vibration_only() {
    let dataset = table(&["2024-02-01 00:00:00,Drill_01,Drill,1,0.0,15.0,80.0,9.0,55.0,20.0,0,0"]);
    let records = anomaly::detect(dataset.readings());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].anomaly, AnomalyKind::HighVibration);
    assert_eq!(records[0].severity, Severity::Medium);
    assert_eq!(records[0].recommendation, "Check bit wear and mounting");
}

#[test]
fn status_mix_kpis() {
    let statuses = [1, 1, 1, 1, 1, 1, 3, 3, 2, 0];
    let rows: Vec<String> = statuses
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "2024-02-01 00:{:02}:00,AHS_01,AHS,{},20.0,40.0,75.0,3.0,55.0,12.0,0,0",
                i, s
            )
        })
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let dataset = table(&refs);

    let k = &kpi::per_machine(dataset.readings()).unwrap()[0];
    assert_eq!(k.utilization_pct, 60.0);
    assert_eq!(k.downtime_pct, 20.0);
    assert_eq!(k.maintenance_pct, 10.0);
    assert_eq!(k.idle_pct, 10.0);

    let fleet = kpi::fleet_wide(dataset.readings()).unwrap();
    assert_eq!(fleet.machines, 1);
    assert_eq!(fleet.rows, 10);
}

#[test]
fn kpis_use_stored_flags() {
    // Stored flags disagree with the values on purpose; KPIs count the flags.
    let dataset = table(&[
        "2024-02-01 00:00:00,AHS_01,AHS,1,20.0,40.0,75.0,3.0,55.0,12.0,1,0",
        "2024-02-01 00:01:00,AHS_01,AHS,1,20.0,40.0,75.0,3.0,55.0,12.0,true,True",
    ]);
    let k = &kpi::per_machine(dataset.readings()).unwrap()[0];
    assert_eq!(k.overheating_events, 2);
    assert_eq!(k.low_pressure_events, 1);
    assert!(anomaly::detect(dataset.readings()).is_empty());
}

#[test]
fn missing_columns_fail_before_detection() {
    let text = "timestamp,machine_id,machine_type,status,speed_kmh\n2024-02-01 00:00:00,AHS_01,AHS,1,60.0\n";
    match Dataset::from_reader(Cursor::new(text)) {
        Err(FleetError::Schema { missing }) => {
            assert_eq!(missing.len(), 7);
            assert!(missing.contains(&"pressure_bar".to_string()));
            assert!(missing.contains(&"flag_low_pressure".to_string()));
        }
        other => panic!("expected schema error, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn empty_table_rejected_by_aggregations() {
    let dataset = table(&[]);
    assert!(dataset.is_empty());
    assert!(anomaly::detect(dataset.readings()).is_empty());
    assert!(matches!(
        kpi::fleet_wide(dataset.readings()),
        Err(FleetError::EmptyDataset { .. })
    ));
    assert!(matches!(
        risk::evaluate(dataset.readings(), &mut LogisticRegression::default(), &RiskConfig::default()),
        Err(FleetError::EmptyDataset { .. })
    ));
}

#[test]
fn single_positive_row_is_insufficient() {
    let dataset = table(&[
        "2024-02-01 00:00:00,AHS_01,AHS,1,20.0,40.0,99.0,3.0,55.0,12.0,1,0",
        "2024-02-01 00:01:00,AHS_01,AHS,1,20.0,40.0,75.0,3.0,55.0,12.0,0,0",
        "2024-02-01 00:02:00,AHS_01,AHS,1,20.0,40.0,75.0,3.0,55.0,12.0,0,0",
    ]);
    let result = risk::evaluate(
        dataset.readings(),
        &mut LogisticRegression::default(),
        &RiskConfig::default(),
    );
    assert!(matches!(
        result,
        Err(FleetError::InsufficientData {
            class: true,
            count: 1
        })
    ));
}

#[test]
fn persisted_pipeline_round_trip() {
    let rows: Vec<String> = (0..200)
        .map(|i| {
            let (id, ty, pressure) = if i % 2 == 0 {
                ("AHS_01", "AHS", 8.0 + (i % 7) as f64)
            } else {
                ("Drill_01", "Drill", 13.0 + (i % 9) as f64)
            };
            format!(
                "2024-02-01 {:02}:{:02}:00,{},{},1,0.0,20.0,{:.1},4.0,55.0,{:.1},0,0",
                i / 2 / 60,
                (i / 2) % 60,
                id,
                ty,
                70.0 + (i % 31) as f64,
                pressure
            )
        })
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let mut dataset = table(&refs);
    for r in &mut dataset.readings {
        r.derive_flags();
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("readings.csv");
    dataset.write_csv(&path).unwrap();
    let loaded = Dataset::read_csv(&path).unwrap();
    assert_eq!(loaded, dataset);

    let eval = risk::evaluate(
        loaded.readings(),
        &mut LogisticRegression::default(),
        &RiskConfig::default(),
    )
    .unwrap();
    assert_eq!(eval.train_rows + eval.test_rows, 200);
    assert!(eval.report.accuracy > 0.5);
    assert!(eval.report.to_string().contains("macro avg"));
}
