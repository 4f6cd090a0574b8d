//! Small ndarray-like types and the least-squares routine used by the
//! collinearity pass.
//!
//! `Array2` (2D) and `Array1` (1D) are lightweight containers with minimal
//! convenience methods, kept dependency-free apart from `num-traits`.
pub mod lstsq;
pub mod matrix;
pub mod vector;

pub use lstsq::{regress, LstsqError, Regression};
pub use matrix::{Array2, ShapeError};
pub use vector::Array1;
