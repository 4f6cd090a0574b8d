//! Integration tests for config loading, overrides and file helpers.

use featprune_cli::commands::integer_labels;
use featprune_cli::config::{load_prune_config, resolve_config, ConfigOverrides};
use featprune_cli::util::{output_path, validate_data_file};
use featprune_selection::config::PruneConfig;
use featprune_selection::data_handling::Column;

// ---------------------------------------------------------------------------
// validate_data_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_tsv_txt_exist() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["data.csv", "data.tsv", "data.txt"] {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap();
        assert!(validate_data_file(&path).is_ok(), "{}", name);
    }
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.parquet");
    std::fs::File::create(&path).unwrap();
    assert!(validate_data_file(&path).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_data_file(std::path::Path::new("/nonexistent/path/data.tsv")).is_err());
}

#[test]
fn output_path_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let path = output_path(&nested, "report.json").unwrap();
    assert!(nested.is_dir());
    assert_eq!(path, nested.join("report.json"));
}

// ---------------------------------------------------------------------------
// PruneConfig loading & overrides
// ---------------------------------------------------------------------------

#[test]
fn config_loads_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"cohort_column": "month", "collinearity": {"vif_threshold": 5.0}}"#,
    )
    .unwrap();

    let cfg = load_prune_config(&path).unwrap();
    assert_eq!(cfg.cohort_column, "month");
    assert_eq!(cfg.collinearity.vif_threshold, 5.0);
    assert_eq!(cfg.stability, PruneConfig::default().stability);
}

#[test]
fn config_round_trips_json() {
    let cfg = PruneConfig::default();
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(json.contains("psi_threshold"));
    assert!(json.contains("vif_threshold"));
    let back: PruneConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn config_missing_file_errors() {
    let err = load_prune_config("/nonexistent/config.json").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config"));
}

#[test]
fn overrides_replace_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"stability": {"psi_threshold": 0.5, "bins": 4}}"#).unwrap();

    let overrides = ConfigOverrides {
        psi_threshold: Some(0.1),
        max_rounds: Some(2),
        ..ConfigOverrides::default()
    };
    let cfg = resolve_config(Some(path.as_path()), &overrides).unwrap();
    assert_eq!(cfg.stability.psi_threshold, 0.1);
    assert_eq!(cfg.stability.bins, 4);
    assert_eq!(cfg.collinearity.max_rounds, Some(2));
}

#[test]
fn resolve_without_file_uses_defaults() {
    let cfg = resolve_config(None, &ConfigOverrides::default()).unwrap();
    assert_eq!(cfg, PruneConfig::default());
}

#[test]
fn resolve_rejects_invalid_overrides() {
    let overrides = ConfigOverrides {
        bins: Some(0),
        ..ConfigOverrides::default()
    };
    assert!(resolve_config(None, &overrides).is_err());
}

// ---------------------------------------------------------------------------
// Gini labels
// ---------------------------------------------------------------------------

#[test]
fn integer_labels_accepts_whole_numbers() {
    let column = Column::Numeric(vec![0.0, 1.0, 1.0]);
    assert_eq!(integer_labels(&column, "y").unwrap(), vec![0, 1, 1]);
}

#[test]
fn integer_labels_rejects_fractions_and_text() {
    assert!(integer_labels(&Column::Numeric(vec![0.0, 0.5]), "y").is_err());
    assert!(integer_labels(&Column::Numeric(vec![0.0, f64::NAN]), "y").is_err());
    assert!(integer_labels(&Column::Categorical(vec!["a".into()]), "y").is_err());
}

#[test]
fn integer_labels_rejects_values_outside_i32() {
    let err = integer_labels(&Column::Numeric(vec![0.0, 3e9]), "y").unwrap_err();
    assert!(err.to_string().contains("out-of-range"), "{}", err);
    assert!(integer_labels(&Column::Numeric(vec![-4e9, 1.0]), "y").is_err());
    assert_eq!(
        integer_labels(&Column::Numeric(vec![i32::MIN as f64, i32::MAX as f64]), "y").unwrap(),
        vec![i32::MIN, i32::MAX]
    );
}
