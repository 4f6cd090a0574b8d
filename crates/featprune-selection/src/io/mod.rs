//! Dataset loading and report writing at the edges of the pruning passes.
pub mod delimited;
pub mod report;

pub use delimited::{read_delimited, read_delimited_with_config, ReaderConfig};
pub use report::{write_feature_list, write_json, write_psi_table, write_vif_rounds};
