//! End-to-end: delimited file -> prune -> report files.

use std::fmt::Write as _;

use featprune_selection::config::PruneConfig;
use featprune_selection::data_handling::value_counts;
use featprune_selection::io::{
    read_delimited, read_delimited_with_config, write_feature_list, write_json, write_psi_table,
    write_vif_rounds, ReaderConfig,
};
use featprune_selection::pipeline::prune;

/// Three monthly cohorts. `x` and `x_copy` repeat the same pattern in every
/// cohort, `z` is independent of them and `drift` jumps in the last cohort.
fn sample_csv() -> String {
    let mut body = String::from("safra,x,x_copy,z,drift,target\n");
    for i in 0..90 {
        let cohort = 202301 + i / 30;
        let k = i % 30;
        let x = ((k * 7) % 13) as f64;
        let x_copy = x * 2.0 + 0.01 * (k % 3) as f64;
        let z = ((k * 11) % 17) as f64 - 0.5 * (k % 2) as f64;
        let drift = if i >= 60 { 100.0 + k as f64 } else { k as f64 };
        let target = (k % 2) as f64;
        writeln!(body, "{},{},{},{},{},{}", cohort, x, x_copy, z, drift, target).unwrap();
    }
    body
}

#[test]
fn prune_from_csv_and_write_reports() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data.csv");
    std::fs::write(&data_path, sample_csv()).unwrap();

    let data = read_delimited(&data_path).unwrap();
    assert_eq!(data.n_rows(), 90);

    let config = PruneConfig {
        target_column: Some("target".to_string()),
        ..PruneConfig::default()
    };
    let report = prune(&data, &config).unwrap();

    assert_eq!(report.candidates, vec!["x", "x_copy", "z", "drift"]);
    assert_eq!(report.dropped_unstable(), vec!["drift"]);
    assert_eq!(report.dropped_collinear().len(), 1);
    assert!(report.kept.contains(&"z".to_string()));
    assert_eq!(report.kept.len(), 2);

    write_feature_list(&report.kept, dir.path().join("kept_features.txt")).unwrap();
    write_psi_table(&report.stability, dir.path().join("psi_table.tsv")).unwrap();
    write_vif_rounds(&report.collinearity, dir.path().join("vif_rounds.tsv")).unwrap();
    write_json(&report, dir.path().join("report.json")).unwrap();

    let kept = std::fs::read_to_string(dir.path().join("kept_features.txt")).unwrap();
    assert_eq!(kept.lines().count(), 2);

    let psi = std::fs::read_to_string(dir.path().join("psi_table.tsv")).unwrap();
    // Header plus two non-reference cohorts for each of four features
    assert_eq!(psi.lines().count(), 1 + 2 * 4);
    assert!(psi.lines().any(|l| l.starts_with("drift\t202303\t") && l.ends_with("true")));

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["stability"]["cohort_column"], "safra");
    assert_eq!(json["kept"].as_array().unwrap().len(), 2);
}

#[test]
fn forced_categorical_cohorts_have_same_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data.tsv");
    std::fs::write(&data_path, sample_csv().replace(',', "\t")).unwrap();

    let config = ReaderConfig {
        categorical_columns: vec!["safra".to_string()],
        ..ReaderConfig::default()
    };
    let data = read_delimited_with_config(&data_path, &config).unwrap();
    let counts = value_counts(&data, "safra").unwrap();
    assert_eq!(counts.len(), 3);
    for entry in &counts {
        assert_eq!(entry.count, 30);
        assert!(entry.value.is_some());
    }
}
