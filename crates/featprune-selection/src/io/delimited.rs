//! Delimited text (CSV / TSV) reader producing a [`Dataset`].
use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::data_handling::{Column, Dataset};

/// Configuration for reading delimited text files.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Field delimiter. When `None` it is inferred from the extension:
    /// `.tsv` and `.txt` are tab separated, anything else comma separated.
    pub delimiter: Option<u8>,
    /// Columns kept as text even if every value parses as a number
    /// (cohort keys such as `202301`).
    pub categorical_columns: Vec<String>,
    /// Cell values treated as missing, compared case-insensitively.
    pub missing_values: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            categorical_columns: Vec::new(),
            missing_values: vec![
                "".to_string(),
                "na".to_string(),
                "nan".to_string(),
                "null".to_string(),
                "none".to_string(),
            ],
        }
    }
}

/// Read a CSV/TSV file with a header row into a [`Dataset`].
pub fn read_delimited<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_delimited_with_config(path, &ReaderConfig::default())
}

/// Read a CSV/TSV file using a custom configuration.
///
/// A column is numeric when every non-missing cell parses as `f64`; missing
/// cells become `NaN`. Otherwise the column is categorical and missing cells
/// become empty strings.
pub fn read_delimited_with_config<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| infer_delimiter(path));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open data file: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(anyhow!("No columns found in {}", path.display()));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.len() != headers.len() {
            return Err(anyhow!(
                "Row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            ));
        }
        for (col, value) in record.iter().enumerate() {
            cells[col].push(value.to_string());
        }
    }

    let missing: HashSet<String> = config
        .missing_values
        .iter()
        .map(|m| m.to_lowercase())
        .collect();
    let forced: HashSet<&str> = config.categorical_columns.iter().map(|s| s.as_str()).collect();

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| {
            let column = if forced.contains(name.as_str()) {
                categorical(values, &missing)
            } else {
                parse_numeric(&values, &missing).unwrap_or_else(|| categorical(values, &missing))
            };
            (name, column)
        })
        .collect();

    let dataset = Dataset::new(columns)
        .with_context(|| format!("Invalid table in {}", path.display()))?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        dataset.n_rows(),
        dataset.n_cols(),
        path.display()
    );
    Ok(dataset)
}

fn infer_delimiter(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("txt") | Some("tab") => b'\t',
        _ => b',',
    }
}

fn is_missing(value: &str, missing: &HashSet<String>) -> bool {
    missing.contains(&value.to_lowercase())
}

fn parse_numeric(values: &[String], missing: &HashSet<String>) -> Option<Column> {
    values
        .iter()
        .map(|v| {
            if is_missing(v, missing) {
                Some(f64::NAN)
            } else {
                v.parse::<f64>().ok()
            }
        })
        .collect::<Option<Vec<f64>>>()
        .map(Column::Numeric)
}

fn categorical(values: Vec<String>, missing: &HashSet<String>) -> Column {
    Column::Categorical(
        values
            .into_iter()
            .map(|v| if is_missing(&v, missing) { String::new() } else { v })
            .collect(),
    )
}
