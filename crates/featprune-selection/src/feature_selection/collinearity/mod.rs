//! Variance-inflation scoring and iterative multicollinearity elimination.
pub mod eliminator;
pub mod vif;

pub use eliminator::{
    drop_colinear_features, CollinearityEliminator, EliminationObserver, EliminationReport,
    EliminationState, LogObserver, RoundRecord, Step, DEFAULT_VIF_THRESHOLD,
};
pub use vif::{feature_vif, vif_score, vif_scores, VifEntry, VifOptions, VifTable};
