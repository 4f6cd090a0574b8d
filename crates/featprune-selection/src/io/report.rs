//! Writers for pruning outputs: feature lists, PSI and VIF tables, JSON reports.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::feature_selection::collinearity::EliminationReport;
use crate::feature_selection::stability::StabilityReport;

/// Serialize `value` as pretty-printed JSON. Non-finite floats become `null`.
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    Ok(())
}

/// One feature name per line.
pub fn write_feature_list<P: AsRef<Path>>(features: &[String], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
    );
    for feature in features {
        writeln!(out, "{}", feature)?;
    }
    out.flush()?;
    Ok(())
}

/// Long-format PSI table: `feature, cohort, psi, max_psi, unstable`.
pub fn write_psi_table<P: AsRef<Path>>(report: &StabilityReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(["feature", "cohort", "psi", "max_psi", "unstable"])?;
    for feature in &report.features {
        for entry in &feature.psi {
            writer.write_record([
                feature.feature.clone(),
                entry.cohort.to_string(),
                format!("{:.6}", entry.psi),
                format!("{:.6}", feature.max_psi),
                feature.unstable.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Long-format VIF table: `round, feature, vif, removed`, one row per
/// feature scored in each round.
pub fn write_vif_rounds<P: AsRef<Path>>(report: &EliminationReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(["round", "feature", "vif", "removed"])?;
    for round in &report.rounds {
        for entry in &round.table.entries {
            let removed = round.removed && entry.feature == round.worst_feature;
            writer.write_record([
                round.round.to_string(),
                entry.feature.clone(),
                format!("{:.6}", entry.vif),
                removed.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
