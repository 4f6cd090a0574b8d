//! Loading the pruning configuration and layering command-line overrides on top.
use std::path::Path;

use anyhow::{Context, Result};

use featprune_selection::config::PruneConfig;

/// Load a pruning configuration from a JSON file. Missing keys take their defaults.
pub fn load_prune_config<P: AsRef<Path>>(path: P) -> Result<PruneConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: PruneConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Values given on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cohort_column: Option<String>,
    pub target_column: Option<String>,
    pub psi_threshold: Option<f64>,
    pub bins: Option<usize>,
    pub vif_threshold: Option<f64>,
    pub max_rounds: Option<i64>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: PruneConfig) -> PruneConfig {
        if let Some(cohort) = &self.cohort_column {
            config.cohort_column = cohort.clone();
        }
        if let Some(target) = &self.target_column {
            config.target_column = Some(target.clone());
        }
        if let Some(threshold) = self.psi_threshold {
            config.stability.psi_threshold = threshold;
        }
        if let Some(bins) = self.bins {
            config.stability.bins = bins;
        }
        if let Some(threshold) = self.vif_threshold {
            config.collinearity.vif_threshold = threshold;
        }
        if let Some(rounds) = self.max_rounds {
            config.collinearity.max_rounds = Some(rounds);
        }
        config
    }
}

/// The file config (or defaults when no file is given) with `overrides` applied.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<PruneConfig> {
    let base = match path {
        Some(path) => {
            log::info!("Using config: {}", path.display());
            load_prune_config(path)?
        }
        None => {
            log::info!("No config provided; using defaults.");
            PruneConfig::default()
        }
    };
    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}
