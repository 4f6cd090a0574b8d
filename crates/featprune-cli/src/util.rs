use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use featprune_selection::data_handling::Dataset;
use featprune_selection::io::read_delimited;

/// Accept `.csv`, `.tsv` and `.txt` files that exist.
pub fn validate_data_file(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") | Some("txt") => {}
        _ => anyhow::bail!(
            "Data file must have a .csv, .tsv or .txt extension: {}",
            path.display()
        ),
    }

    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    Ok(())
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    validate_data_file(path)?;
    let data = read_delimited(path)?;
    data.log_summary();
    Ok(data)
}

/// Create `dir` (and parents) if needed and return the path of `name` inside it.
pub fn output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    Ok(dir.join(name))
}
