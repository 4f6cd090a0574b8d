//! Stability filter followed by collinearity elimination on the stable survivors.
use serde::Serialize;

use crate::config::PruneConfig;
use crate::data_handling::{dedup_names, value_counts, Dataset, ValueCount};
use crate::error::Result;
use crate::feature_selection::collinearity::{EliminationObserver, EliminationReport, LogObserver};
use crate::feature_selection::stability::StabilityReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PruneReport {
    pub candidates: Vec<String>,
    pub cohort_sizes: Vec<ValueCount>,
    pub stability: StabilityReport,
    pub collinearity: EliminationReport,
    /// Candidates that survived both passes, in candidate order.
    pub kept: Vec<String>,
}

impl PruneReport {
    pub fn dropped_unstable(&self) -> Vec<String> {
        self.stability.unstable_features()
    }

    pub fn dropped_collinear(&self) -> &[String] {
        &self.collinearity.removed
    }
}

pub fn prune(data: &Dataset, config: &PruneConfig) -> Result<PruneReport> {
    prune_with_observer(data, config, &mut LogObserver)
}

/// Run both passes as configured, reporting elimination rounds to `observer`.
pub fn prune_with_observer(
    data: &Dataset,
    config: &PruneConfig,
    observer: &mut dyn EliminationObserver,
) -> Result<PruneReport> {
    config.validate()?;
    let candidates = dedup_names(&config.resolve_features(data));

    let cohort_sizes = value_counts(data, &config.cohort_column)?;
    for entry in &cohort_sizes {
        log::info!(
            "Cohort {}: {} rows ({:.1}%)",
            entry
                .value
                .as_ref()
                .map_or_else(|| "<missing>".to_string(), |v| v.to_string()),
            entry.count,
            entry.fraction * 100.0
        );
    }

    let stability = config
        .stability
        .build()?
        .evaluate(data, &config.cohort_column, &candidates)?;
    let stable = stability.stable_features();

    let collinearity = config
        .collinearity
        .build()?
        .run_with_observer(data, &stable, observer)?;

    let kept = candidates
        .iter()
        .filter(|f| collinearity.survivors.contains(f))
        .cloned()
        .collect();

    Ok(PruneReport {
        candidates,
        cohort_sizes,
        stability,
        collinearity,
        kept,
    })
}
