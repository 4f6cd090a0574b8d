//! featprune-selection: candidate-feature pruning for tabular datasets.
//!
//! This crate provides a population-stability filter (PSI of every feature
//! across time cohorts against the earliest cohort), an iterative
//! variance-inflation eliminator for multicollinearity, and a Gini/AUC metric
//! to check the predictive value of the pruned set. Data loading, config and
//! report writing live at the edges in `io` and `config`.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod stats;

pub use error::{Result, SelectionError};
