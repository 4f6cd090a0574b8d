use std::error::Error;
use std::fmt;

use crate::math::ShapeError;

/// Errors raised by the selection passes and metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// A threshold, bin count or round limit outside its valid domain.
    InvalidParameter(String),
    /// The regression behind a VIF score could not be solved.
    SingularRegression { feature: String },
    /// Labels contain only one class, so AUC is undefined.
    DegenerateLabelSet,
    LengthMismatch { expected: usize, found: usize },
    NaNFound(usize), // Number of NaN values found
    UnknownColumn(String),
    NonNumericColumn(String),
    DuplicateColumn(String),
}

pub type Result<T> = std::result::Result<T, SelectionError>;

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            SelectionError::SingularRegression { feature } => {
                write!(f, "Singular regression while scoring feature '{}'", feature)
            }
            SelectionError::DegenerateLabelSet => {
                write!(f, "Labels must contain both a positive and a negative class")
            }
            SelectionError::LengthMismatch { expected, found } => write!(
                f,
                "Length mismatch: expected {} values, found {}",
                expected, found
            ),
            SelectionError::NaNFound(count) => write!(f, "Found {} NaN values in scores array", count),
            SelectionError::UnknownColumn(name) => write!(f, "Unknown column '{}'", name),
            SelectionError::NonNumericColumn(name) => {
                write!(f, "Column '{}' is not numeric", name)
            }
            SelectionError::DuplicateColumn(name) => write!(f, "Duplicate column '{}'", name),
        }
    }
}

impl Error for SelectionError {}

impl From<ShapeError> for SelectionError {
    fn from(err: ShapeError) -> Self {
        SelectionError::InvalidParameter(err.to_string())
    }
}

/// Reject NaN and infinite thresholds.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SelectionError::InvalidParameter(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}

/// Reject a zero bin count.
pub(crate) fn ensure_bins(bins: usize) -> Result<()> {
    if bins == 0 {
        Err(SelectionError::InvalidParameter(
            "bin count must be at least 1".to_string(),
        ))
    } else {
        Ok(())
    }
}
