//! Subcommand bodies. Each loads the data, runs one pass (or the full
//! pipeline) and writes its outputs to a directory, or prints the resulting
//! feature list to stdout when no directory is given.
use std::path::Path;

use anyhow::{Context, Result};

use featprune_selection::config::PruneConfig;
use featprune_selection::data_handling::{dedup_names, Column, Dataset};
use featprune_selection::feature_selection::collinearity::EliminationReport;
use featprune_selection::feature_selection::stability::StabilityReport;
use featprune_selection::io::{write_feature_list, write_json, write_psi_table, write_vif_rounds};
use featprune_selection::pipeline::{prune, PruneReport};
use featprune_selection::stats::gini_from_labels;

use crate::util::{load_dataset, output_path};

fn candidates(data: &Dataset, config: &PruneConfig) -> Vec<String> {
    dedup_names(&config.resolve_features(data))
}

fn print_features(features: &[String]) {
    for feature in features {
        println!("{}", feature);
    }
}

pub fn run_stability(
    data_path: &Path,
    config: &PruneConfig,
    out_dir: Option<&Path>,
) -> Result<StabilityReport> {
    let data = load_dataset(data_path)?;
    let features = candidates(&data, config);
    let report = config
        .stability
        .build()?
        .evaluate(&data, &config.cohort_column, &features)?;
    let unstable = report.unstable_features();

    match out_dir {
        Some(dir) => {
            write_psi_table(&report, output_path(dir, "psi_table.tsv")?)?;
            write_feature_list(&unstable, output_path(dir, "dropped_unstable.txt")?)?;
            write_json(&report, output_path(dir, "stability.json")?)?;
            log::info!("Wrote stability outputs to {}", dir.display());
        }
        None => print_features(&unstable),
    }
    Ok(report)
}

pub fn run_collinearity(
    data_path: &Path,
    config: &PruneConfig,
    out_dir: Option<&Path>,
) -> Result<EliminationReport> {
    let data = load_dataset(data_path)?;
    let features = candidates(&data, config);
    let report = config.collinearity.build()?.run(&data, &features)?;

    match out_dir {
        Some(dir) => {
            write_vif_rounds(&report, output_path(dir, "vif_rounds.tsv")?)?;
            write_feature_list(&report.removed, output_path(dir, "dropped_collinear.txt")?)?;
            write_json(&report, output_path(dir, "collinearity.json")?)?;
            log::info!("Wrote collinearity outputs to {}", dir.display());
        }
        None => print_features(&report.removed),
    }
    Ok(report)
}

pub fn run_prune(data_path: &Path, config: &PruneConfig, out_dir: Option<&Path>) -> Result<PruneReport> {
    let data = load_dataset(data_path)?;
    let report = prune(&data, config)?;
    log::info!(
        "Kept {} of {} candidates ({} unstable, {} collinear)",
        report.kept.len(),
        report.candidates.len(),
        report.dropped_unstable().len(),
        report.dropped_collinear().len()
    );

    match out_dir {
        Some(dir) => {
            write_feature_list(&report.kept, output_path(dir, "kept_features.txt")?)?;
            write_feature_list(&report.dropped_unstable(), output_path(dir, "dropped_unstable.txt")?)?;
            write_feature_list(report.dropped_collinear(), output_path(dir, "dropped_collinear.txt")?)?;
            write_psi_table(&report.stability, output_path(dir, "psi_table.tsv")?)?;
            write_vif_rounds(&report.collinearity, output_path(dir, "vif_rounds.tsv")?)?;
            write_json(&report, output_path(dir, "report.json")?)?;
            log::info!("Wrote pruning outputs to {}", dir.display());
        }
        None => print_features(&report.kept),
    }
    Ok(report)
}

/// Integer class labels from a numeric column. Missing, fractional or
/// out-of-`i32`-range values are rejected.
pub fn integer_labels(column: &Column, name: &str) -> Result<Vec<i32>> {
    let Column::Numeric(values) = column else {
        anyhow::bail!("Label column '{}' must be numeric", name);
    };
    values
        .iter()
        .enumerate()
        .map(|(row, &v)| {
            if !v.is_finite() || v.fract() != 0.0 {
                anyhow::bail!(
                    "Label column '{}' has a non-integer value at row {}: {}",
                    name,
                    row + 1,
                    v
                );
            }
            if !(i32::MIN as f64..=i32::MAX as f64).contains(&v) {
                anyhow::bail!(
                    "Label column '{}' has an out-of-range value at row {}: {}",
                    name,
                    row + 1,
                    v
                );
            }
            Ok(v as i32)
        })
        .collect()
}

pub fn run_gini(data_path: &Path, label: &str, score: &str) -> Result<f64> {
    let data = load_dataset(data_path)?;
    let labels = integer_labels(data.column(label)?, label)?;
    let scores = data.numeric_column(score)?;
    let value = gini_from_labels(&labels, scores)
        .with_context(|| format!("Failed to compute Gini of '{}' against '{}'", score, label))?;
    println!("{:.6}", value);
    Ok(value)
}
