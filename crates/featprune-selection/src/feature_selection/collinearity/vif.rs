//! Variance Inflation Factor (VIF).
//!
//! VIF_j = 1 / (1 - R²_j), where R²_j comes from regressing column j on every
//! other column of the same set. Singular regressions score `+inf`.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_handling::Dataset;
use crate::error::{Result, SelectionError};
use crate::math::{regress, Array1, Array2, LstsqError};

/// `1 - R²` at or below this is an exact fit and scores `+inf`.
const EXACT_FIT_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VifOptions {
    /// Fit each auxiliary regression with an intercept. When false the columns
    /// are used as-is and R² is uncentred.
    pub center: bool,
}

impl Default for VifOptions {
    fn default() -> Self {
        VifOptions { center: true }
    }
}

/// VIF of `column` against the remaining columns of `x`.
///
/// A single-column matrix scores 1. Any singular fit is returned as an error.
pub fn vif_score(
    x: &Array2<f64>,
    column: usize,
    options: VifOptions,
) -> std::result::Result<f64, LstsqError> {
    let y = x.column(column);
    let others: Vec<Array1<f64>> = (0..x.ncols())
        .filter(|&c| c != column)
        .map(|c| x.column(c))
        .collect();

    let fit = regress(&y, &others, options.center)?;
    let tolerance = 1.0 - fit.r_squared;
    if !(tolerance > EXACT_FIT_TOL) {
        return Err(LstsqError::ZeroVariance);
    }
    Ok(1.0 / tolerance)
}

/// VIF of every column of `x`, singular fits reported as `+inf`.
///
/// Columns are scored in parallel; the output is in column order.
pub fn vif_scores(x: &Array2<f64>, options: VifOptions) -> Vec<f64> {
    (0..x.ncols())
        .into_par_iter()
        .map(|c| vif_score(x, c, options).unwrap_or(f64::INFINITY))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VifEntry {
    pub feature: String,
    /// `+inf` when the regression is singular (serialised as `null` in JSON).
    pub vif: f64,
}

/// One VIF per feature, in the order the features were given.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VifTable {
    pub entries: Vec<VifEntry>,
}

impl VifTable {
    /// Score `features` against each other. Rows with a non-finite value in
    /// any selected column are left out of the regressions.
    pub fn compute(data: &Dataset, features: &[String], options: VifOptions) -> Result<Self> {
        let (view, dropped) = data.complete_numeric_view(features)?;
        if dropped > 0 {
            log::debug!("VIF: ignoring {} incomplete rows", dropped);
        }

        let scores = vif_scores(&view, options);
        let entries = features
            .iter()
            .zip(scores)
            .map(|(feature, vif)| {
                if vif.is_infinite() {
                    log::warn!("VIF of '{}' is unbounded (singular regression)", feature);
                }
                VifEntry {
                    feature: feature.clone(),
                    vif,
                }
            })
            .collect();
        Ok(VifTable { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.feature == feature)
            .map(|e| e.vif)
    }

    /// Entries sorted by descending VIF, NaN ranking as `+inf`.
    ///
    /// Finite ties keep their original order. Unbounded ties put the later
    /// feature first: when a column is an exact combination of earlier ones,
    /// every member of the dependency scores `+inf` and the one added last
    /// is the one to drop.
    pub fn ranked(&self) -> Vec<&VifEntry> {
        let mut ranked: Vec<(usize, &VifEntry)> = self.entries.iter().enumerate().collect();
        ranked.sort_by(|(ia, a), (ib, b)| {
            let (va, vb) = (rank_value(a.vif), rank_value(b.vif));
            vb.total_cmp(&va).then_with(|| {
                if va.is_infinite() {
                    ib.cmp(ia)
                } else {
                    Ordering::Equal
                }
            })
        });
        ranked.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Highest-VIF entry; see [`VifTable::ranked`] for ties.
    pub fn worst(&self) -> Option<&VifEntry> {
        self.ranked().into_iter().next()
    }
}

/// Score used for ordering and threshold tests: NaN counts as unbounded.
pub(crate) fn rank_value(vif: f64) -> f64 {
    if vif.is_nan() {
        f64::INFINITY
    } else {
        vif
    }
}

/// VIF of `feature` against the rest of `features`.
///
/// Unlike [`VifTable::compute`], a singular regression is an error here.
pub fn feature_vif(
    data: &Dataset,
    features: &[String],
    feature: &str,
    options: VifOptions,
) -> Result<f64> {
    let column = features
        .iter()
        .position(|f| f == feature)
        .ok_or_else(|| SelectionError::UnknownColumn(feature.to_string()))?;
    let (view, _) = data.complete_numeric_view(features)?;
    vif_score(&view, column, options).map_err(|_| SelectionError::SingularRegression {
        feature: feature.to_string(),
    })
}
