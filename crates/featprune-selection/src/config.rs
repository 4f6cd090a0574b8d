use serde::{Deserialize, Serialize};

use crate::data_handling::Dataset;
use crate::error::{ensure_bins, ensure_finite, Result, SelectionError};
use crate::feature_selection::collinearity::{CollinearityEliminator, VifOptions, DEFAULT_VIF_THRESHOLD};
use crate::feature_selection::stability::{OutOfRange, StabilityFilter, DEFAULT_PSI_BINS};

/// Central configuration for a pruning run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PruneConfig {
    /// Column holding each row's cohort ("safra").
    pub cohort_column: String,
    /// Candidate features. `None` means every numeric column except the
    /// cohort and target columns.
    pub features: Option<Vec<String>>,
    pub target_column: Option<String>,
    pub stability: StabilityConfig,
    pub collinearity: CollinearityConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StabilityConfig {
    pub psi_threshold: f64,
    pub bins: usize,
    pub out_of_range: OutOfRange,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CollinearityConfig {
    pub vif_threshold: f64,
    /// Rounds allowed after the first; `None` is unbounded.
    pub max_rounds: Option<i64>,
    pub center: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            cohort_column: "safra".to_string(),
            features: None,
            target_column: None,
            stability: StabilityConfig::default(),
            collinearity: CollinearityConfig::default(),
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            psi_threshold: 0.2,
            bins: DEFAULT_PSI_BINS,
            out_of_range: OutOfRange::Discard,
        }
    }
}

impl Default for CollinearityConfig {
    fn default() -> Self {
        Self {
            vif_threshold: DEFAULT_VIF_THRESHOLD,
            max_rounds: None,
            center: true,
        }
    }
}

impl StabilityConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("psi_threshold", self.psi_threshold)?;
        ensure_bins(self.bins)
    }

    pub fn build(&self) -> Result<StabilityFilter> {
        Ok(StabilityFilter::new(self.psi_threshold)?
            .with_bins(self.bins)?
            .with_out_of_range(self.out_of_range))
    }
}

impl CollinearityConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("vif_threshold", self.vif_threshold)?;
        self.round_limit().map(|_| ())
    }

    /// The round limit as an unsigned count; negative values are rejected.
    pub fn round_limit(&self) -> Result<Option<usize>> {
        match self.max_rounds {
            None => Ok(None),
            Some(n) if n >= 0 => Ok(Some(n as usize)),
            Some(n) => Err(SelectionError::InvalidParameter(format!(
                "max_rounds must not be negative, got {}",
                n
            ))),
        }
    }

    pub fn build(&self) -> Result<CollinearityEliminator> {
        Ok(CollinearityEliminator::new(self.vif_threshold)?
            .with_max_rounds(self.round_limit()?)
            .with_options(VifOptions {
                center: self.center,
            }))
    }
}

impl PruneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cohort_column.trim().is_empty() {
            return Err(SelectionError::InvalidParameter(
                "cohort_column must not be empty".to_string(),
            ));
        }
        self.stability.validate()?;
        self.collinearity.validate()
    }

    /// The candidate list for `data`: the configured features, or every
    /// numeric column other than the cohort and target columns.
    pub fn resolve_features(&self, data: &Dataset) -> Vec<String> {
        match &self.features {
            Some(features) => features.clone(),
            None => data
                .numeric_column_names()
                .into_iter()
                .filter(|name| *name != self.cohort_column)
                .filter(|name| self.target_column.as_deref() != Some(name.as_str()))
                .collect(),
        }
    }
}
