//! Cohort-over-cohort stability filter.
//!
//! The earliest cohort ("safra") is the reference. Every candidate feature is
//! compared, cohort by cohort, against its own reference distribution and is
//! flagged unstable when its worst PSI exceeds the threshold.

use rayon::prelude::*;
use serde::Serialize;

use crate::data_handling::{dedup_names, CohortKey, Dataset};
use crate::error::{ensure_bins, ensure_finite, Result};
use crate::feature_selection::stability::psi::{psi_from_proportions, BinEdges, OutOfRange};

pub const DEFAULT_PSI_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortPsi {
    pub cohort: CohortKey,
    pub psi: f64,
}

/// Stability verdict for a single feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStability {
    pub feature: String,
    /// PSI against every non-reference cohort, in cohort order.
    pub psi: Vec<CohortPsi>,
    pub max_psi: f64,
    pub unstable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    pub cohort_column: String,
    pub reference_cohort: Option<CohortKey>,
    pub cohorts: Vec<CohortKey>,
    pub psi_threshold: f64,
    pub bins: usize,
    pub features: Vec<FeatureStability>,
}

impl StabilityReport {
    pub fn unstable_features(&self) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| f.unstable)
            .map(|f| f.feature.clone())
            .collect()
    }

    pub fn stable_features(&self) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| !f.unstable)
            .map(|f| f.feature.clone())
            .collect()
    }
}

/// Flags features whose distribution drifts across cohorts.
#[derive(Debug, Clone)]
pub struct StabilityFilter {
    psi_threshold: f64,
    bins: usize,
    out_of_range: OutOfRange,
}

impl StabilityFilter {
    /// Creates a filter with the default 10 bins.
    ///
    /// # Arguments
    ///
    /// * `psi_threshold` - Largest PSI a stable feature may reach in any cohort.
    pub fn new(psi_threshold: f64) -> Result<Self> {
        ensure_finite("PSI threshold", psi_threshold)?;
        Ok(StabilityFilter {
            psi_threshold,
            bins: DEFAULT_PSI_BINS,
            out_of_range: OutOfRange::default(),
        })
    }

    pub fn with_bins(mut self, bins: usize) -> Result<Self> {
        ensure_bins(bins)?;
        self.bins = bins;
        Ok(self)
    }

    pub fn with_out_of_range(mut self, policy: OutOfRange) -> Self {
        self.out_of_range = policy;
        self
    }

    /// Score every candidate against every non-reference cohort.
    ///
    /// # Arguments
    ///
    /// * `data` - The dataset; only read.
    /// * `cohort_column` - Column holding each row's cohort.
    /// * `features` - Candidate feature names (duplicates are ignored).
    ///
    /// # Returns
    ///
    /// A report with one entry per distinct candidate, in candidate order.
    pub fn evaluate(
        &self,
        data: &Dataset,
        cohort_column: &str,
        features: &[String],
    ) -> Result<StabilityReport> {
        let groups = data.partition_by(cohort_column)?;
        let features = dedup_names(features);

        // Resolve every column up front so lookup errors surface before any work.
        let columns = features
            .iter()
            .map(|name| data.numeric_column(name))
            .collect::<Result<Vec<&[f64]>>>()?;

        let cohorts: Vec<CohortKey> = groups.keys().cloned().collect();
        let mut rows = groups.into_values();
        let reference_rows = rows.next().unwrap_or_default();
        let other_rows: Vec<Vec<usize>> = rows.collect();

        log::debug!(
            "Stability filter: {} cohorts in '{}', reference {:?}, {} candidates",
            cohorts.len(),
            cohort_column,
            cohorts.first().map(|c| c.to_string()),
            features.len()
        );

        let results = features
            .par_iter()
            .zip(columns.par_iter())
            .map(|(name, values)| {
                let gather = |idx: &[usize]| idx.iter().map(|&r| values[r]).collect::<Vec<f64>>();
                let reference = gather(&reference_rows);
                let edges = BinEdges::fit(&reference, self.bins)?;
                let ref_props = edges.proportions(&reference, self.out_of_range);

                let psi = cohorts
                    .iter()
                    .skip(1)
                    .zip(other_rows.iter())
                    .map(|(cohort, idx)| {
                        let current = edges.proportions(&gather(idx), self.out_of_range);
                        Ok(CohortPsi {
                            cohort: cohort.clone(),
                            psi: psi_from_proportions(&ref_props, &current)?,
                        })
                    })
                    .collect::<Result<Vec<CohortPsi>>>()?;

                let max_psi = psi.iter().map(|p| p.psi).fold(0.0, f64::max);
                let unstable = max_psi > self.psi_threshold;
                log::debug!("Feature '{}': max PSI {:.4}", name, max_psi);

                Ok(FeatureStability {
                    feature: name.clone(),
                    psi,
                    max_psi,
                    unstable,
                })
            })
            .collect::<Result<Vec<FeatureStability>>>()?;

        let report = StabilityReport {
            cohort_column: cohort_column.to_string(),
            reference_cohort: cohorts.first().cloned(),
            cohorts,
            psi_threshold: self.psi_threshold,
            bins: self.bins,
            features: results,
        };

        log::info!(
            "Stability filter: {} of {} features unstable (PSI > {})",
            report.features.iter().filter(|f| f.unstable).count(),
            report.features.len(),
            self.psi_threshold
        );
        Ok(report)
    }

    /// Names of the unstable candidates, in candidate order.
    pub fn unstable_features(
        &self,
        data: &Dataset,
        cohort_column: &str,
        features: &[String],
    ) -> Result<Vec<String>> {
        Ok(self.evaluate(data, cohort_column, features)?.unstable_features())
    }
}

/// List the features whose PSI exceeds `psi_threshold` in at least one cohort.
///
/// Convenience wrapper over [`StabilityFilter`].
pub fn drop_unstable_features(
    data: &Dataset,
    cohort_column: &str,
    features: &[String],
    psi_threshold: f64,
    bins: usize,
) -> Result<Vec<String>> {
    StabilityFilter::new(psi_threshold)?
        .with_bins(bins)?
        .unstable_features(data, cohort_column, features)
}
