//! Temporal population-stability filtering.
pub mod filter;
pub mod psi;

pub use filter::{
    drop_unstable_features, CohortPsi, FeatureStability, StabilityFilter, StabilityReport,
    DEFAULT_PSI_BINS,
};
pub use psi::{calculate_psi, calculate_psi_with, psi_from_proportions, BinEdges, OutOfRange, PSI_FLOOR};
