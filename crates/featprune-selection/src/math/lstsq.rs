//! Ordinary least squares through the normal equations.
//!
//! Predictor columns are scaled to unit norm before the Gram matrix is
//! factorised, so the pivot tolerance is relative and an exact linear
//! dependency among predictors shows up as a vanishing pivot instead of a
//! silently huge coefficient.

use std::error::Error;
use std::fmt;

use crate::math::Array1;

/// Smallest pivot accepted on the unit-scaled Gram matrix.
const PIVOT_TOL: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Centred R² when fitted with an intercept, uncentred otherwise.
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LstsqError {
    /// The target has no (centred or raw) variation to explain.
    ZeroVariance,
    /// Predictor `column` is a linear combination of the others, or constant.
    RankDeficient { column: usize },
    LengthMismatch,
}

impl fmt::Display for LstsqError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LstsqError::ZeroVariance => write!(f, "Target has zero total sum of squares"),
            LstsqError::RankDeficient { column } => {
                write!(f, "Predictor {} is linearly dependent on the others", column)
            }
            LstsqError::LengthMismatch => {
                write!(f, "Target and predictors must have equal lengths")
            }
        }
    }
}

impl Error for LstsqError {}

/// Regress `y` on `predictors`.
///
/// # Arguments
///
/// * `y` - The response vector.
/// * `predictors` - One array per regressor, each the same length as `y`.
/// * `intercept` - Fit an intercept (equivalently, centre every column first).
///
/// # Returns
///
/// The fitted coefficients (in predictor order) and R². With no predictors
/// R² is zero.
pub fn regress(
    y: &Array1<f64>,
    predictors: &[Array1<f64>],
    intercept: bool,
) -> Result<Regression, LstsqError> {
    if predictors.iter().any(|p| p.len() != y.len()) {
        return Err(LstsqError::LengthMismatch);
    }

    let y_work = if intercept { y.centered() } else { y.clone() };
    let tss = y_work.sum_of_squares();
    if !(tss > 0.0) {
        return Err(LstsqError::ZeroVariance);
    }

    let xs: Vec<Array1<f64>> = predictors
        .iter()
        .map(|p| if intercept { p.centered() } else { p.clone() })
        .collect();

    let mut norms = Vec::with_capacity(xs.len());
    for (column, x) in xs.iter().enumerate() {
        let norm = x.sum_of_squares().sqrt();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(LstsqError::RankDeficient { column });
        }
        norms.push(norm);
    }

    let p = xs.len();
    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];
    for i in 0..p {
        for j in i..p {
            let g = xs[i].dot(&xs[j]) / (norms[i] * norms[j]);
            gram[i][j] = g;
            gram[j][i] = g;
        }
        rhs[i] = xs[i].dot(&y_work) / norms[i];
    }

    let scaled = solve_in_place(gram, rhs)?;
    let coefficients: Vec<f64> = scaled
        .iter()
        .zip(norms.iter())
        .map(|(b, n)| b / n)
        .collect();

    let mut ssr = 0.0;
    for row in 0..y_work.len() {
        let fitted: f64 = coefficients
            .iter()
            .zip(xs.iter())
            .map(|(b, x)| b * x[row])
            .sum();
        let resid = y_work[row] - fitted;
        ssr += resid * resid;
    }

    let intercept_value = if intercept {
        let y_mean = y.mean().unwrap_or(0.0);
        coefficients
            .iter()
            .zip(predictors.iter())
            .fold(y_mean, |acc, (b, x)| acc - b * x.mean().unwrap_or(0.0))
    } else {
        0.0
    };

    Ok(Regression {
        coefficients,
        intercept: intercept_value,
        r_squared: 1.0 - ssr / tss,
    })
}

/// Gaussian elimination with partial pivoting on a dense square system.
fn solve_in_place(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, LstsqError> {
    let n = b.len();
    let mut order: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let pivot_row = (k..n)
            .max_by(|&i, &j| a[i][k].abs().total_cmp(&a[j][k].abs()))
            .unwrap_or(k);
        if !(a[pivot_row][k].abs() > PIVOT_TOL) {
            return Err(LstsqError::RankDeficient { column: order[k] });
        }
        a.swap(k, pivot_row);
        b.swap(k, pivot_row);
        order.swap(k, pivot_row);

        for i in (k + 1)..n {
            let factor = a[i][k] / a[k][k];
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                a[i][j] -= factor * a[k][j];
            }
            b[i] -= factor * b[k];
        }
    }

    let mut x = vec![0.0; n];
    for k in (0..n).rev() {
        let tail: f64 = ((k + 1)..n).map(|j| a[k][j] * x[j]).sum();
        x[k] = (b[k] - tail) / a[k][k];
    }
    Ok(x)
}
