//! Population Stability Index (PSI) between a reference and a comparison sample.
//!
//! Binning is split in two phases: `BinEdges::fit` derives equal-width edges
//! from the reference sample once, and `BinEdges::proportions` scores any
//! sample against those same edges. Every comparison for one feature must go
//! through the edges fitted on its reference.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_bins, Result, SelectionError};

/// Floor applied to empty-bin proportions before the log ratio.
pub const PSI_FLOOR: f64 = 1e-5;

/// What to do with comparison values that fall outside the reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Leave them out of the counts (numpy `histogram` behaviour).
    #[default]
    Discard,
    /// Count them in the first or last bin.
    Clamp,
}

/// Equal-width bin edges fitted on a reference sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Fit `bins` equal-width bins over the finite range of `reference`.
    ///
    /// A constant reference is widened to `[v - 0.5, v + 0.5]`; a reference
    /// without finite values falls back to `[0, 1]`.
    pub fn fit(reference: &[f64], bins: usize) -> Result<Self> {
        ensure_bins(bins)?;

        let (lo, hi) = reference
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 1.0));
        let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };

        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
        edges.push(hi);
        Ok(BinEdges { edges })
    }

    pub fn bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin of `value`: half-open `[e_i, e_i+1)` bins, the last one closed.
    fn locate(&self, value: f64, policy: OutOfRange) -> Option<usize> {
        let last = self.bins() - 1;
        let (lo, hi) = (self.edges[0], self.edges[self.bins()]);
        if value < lo {
            return (policy == OutOfRange::Clamp).then_some(0);
        }
        if value > hi {
            return (policy == OutOfRange::Clamp).then_some(last);
        }
        if value == hi {
            return Some(last);
        }
        let upper = self.edges.partition_point(|&e| e <= value);
        Some(upper.saturating_sub(1).min(last))
    }

    /// Per-bin counts of the finite values in `sample`.
    pub fn counts(&self, sample: &[f64], policy: OutOfRange) -> Vec<usize> {
        let mut counts = vec![0usize; self.bins()];
        for &value in sample.iter().filter(|v| v.is_finite()) {
            if let Some(bin) = self.locate(value, policy) {
                counts[bin] += 1;
            }
        }
        counts
    }

    /// Per-bin share of `sample`. An empty sample gives all zeros.
    pub fn proportions(&self, sample: &[f64], policy: OutOfRange) -> Vec<f64> {
        let counts = self.counts(sample, policy);
        let total: usize = counts.iter().sum();
        counts
            .into_iter()
            .map(|c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect()
    }
}

/// PSI between two proportion vectors computed on the same edges.
///
/// Zero proportions are floored to [`PSI_FLOOR`], so the result is always finite.
/// Vectors of different lengths were not binned on the same edges and give
/// `LengthMismatch`.
pub fn psi_from_proportions(reference: &[f64], current: &[f64]) -> Result<f64> {
    if reference.len() != current.len() {
        return Err(SelectionError::LengthMismatch {
            expected: reference.len(),
            found: current.len(),
        });
    }
    let floor = |p: f64| if p == 0.0 { PSI_FLOOR } else { p };
    Ok(reference
        .iter()
        .zip(current.iter())
        .map(|(&r, &c)| {
            let (r, c) = (floor(r), floor(c));
            (c - r) * (c / r).ln()
        })
        .sum())
}

/// Compute the PSI of `current` against `reference` using `bins` equal-width bins.
///
/// # Arguments
///
/// * `reference` - Sample the bin edges are fitted on.
/// * `current` - Sample compared against the reference.
/// * `bins` - Number of bins, at least 1.
///
/// # Returns
///
/// A non-negative PSI. Out-of-range values in `current` are discarded.
pub fn calculate_psi(reference: &[f64], current: &[f64], bins: usize) -> Result<f64> {
    calculate_psi_with(reference, current, bins, OutOfRange::Discard)
}

/// [`calculate_psi`] with an explicit out-of-range policy.
pub fn calculate_psi_with(
    reference: &[f64],
    current: &[f64],
    bins: usize,
    policy: OutOfRange,
) -> Result<f64> {
    let edges = BinEdges::fit(reference, bins)?;
    let ref_props = edges.proportions(reference, policy);
    let cur_props = edges.proportions(current, policy);
    psi_from_proportions(&ref_props, &cur_props)
}
