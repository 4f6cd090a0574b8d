//! In-memory tabular dataset and the helpers the selection passes read it through.
//!
//! A `Dataset` is an ordered set of named, row-aligned columns. Numeric columns
//! hold `f64` (missing values are `NaN`), categorical columns hold strings
//! (missing values are empty). Passes never mutate it; they take column views.
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::{Result, SelectionError};
use crate::math::Array2;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Grouping key of one cell, `None` when the cell is missing.
    pub fn key_at(&self, row: usize) -> Option<CohortKey> {
        match self {
            Column::Numeric(v) => {
                // `total_cmp` would split -0.0 and 0.0 into two groups
                let value = if v[row] == 0.0 { 0.0 } else { v[row] };
                (!value.is_nan()).then_some(CohortKey::Number(value))
            }
            Column::Categorical(v) => {
                let value = v[row].trim();
                (!value.is_empty()).then(|| CohortKey::Text(value.to_string()))
            }
        }
    }
}

/// A totally ordered grouping value, used for cohort ("safra") keys and value counts.
///
/// Numbers order by `f64::total_cmp` and sort before any text value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CohortKey {
    Number(f64),
    Text(String),
}

impl PartialEq for CohortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CohortKey {}

impl PartialOrd for CohortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CohortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CohortKey::Number(a), CohortKey::Number(b)) => a.total_cmp(b),
            (CohortKey::Text(a), CohortKey::Text(b)) => a.cmp(b),
            (CohortKey::Number(_), CohortKey::Text(_)) => Ordering::Less,
            (CohortKey::Text(_), CohortKey::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for CohortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CohortKey::Number(v) => write!(f, "{}", v),
            CohortKey::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from named columns. All columns must have the same
    /// length and names must be unique.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        let mut index = HashMap::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != n_rows {
                return Err(SelectionError::LengthMismatch {
                    expected: n_rows,
                    found: column.len(),
                });
            }
            if index.insert(name.clone(), names.len()).is_some() {
                return Err(SelectionError::DuplicateColumn(name));
            }
            names.push(name);
            data.push(column);
        }

        Ok(Dataset {
            names,
            columns: data,
            index,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.index
            .get(name)
            .map(|&idx| &self.columns[idx])
            .ok_or_else(|| SelectionError::UnknownColumn(name.to_string()))
    }

    pub fn numeric_column(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Categorical(_) => Err(SelectionError::NonNumericColumn(name.to_string())),
        }
    }

    /// Names of all numeric columns, in dataset order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(self.columns.iter())
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Rows x `features` matrix, keeping only rows where every selected value is finite.
    ///
    /// Returns the view and the number of rows left out.
    pub fn complete_numeric_view(&self, features: &[String]) -> Result<(Array2<f64>, usize)> {
        let columns = features
            .iter()
            .map(|name| self.numeric_column(name))
            .collect::<Result<Vec<&[f64]>>>()?;

        let complete: Vec<usize> = (0..self.n_rows)
            .filter(|&row| columns.iter().all(|c| c[row].is_finite()))
            .collect();

        let mut data = Vec::with_capacity(complete.len() * columns.len());
        for &row in &complete {
            data.extend(columns.iter().map(|c| c[row]));
        }
        let view = Array2::from_shape_vec((complete.len(), columns.len()), data)?;
        Ok((view, self.n_rows - complete.len()))
    }

    /// Row indices of every distinct value of `key_column`, in ascending key order.
    /// Rows with a missing key are left out.
    pub fn partition_by(&self, key_column: &str) -> Result<BTreeMap<CohortKey, Vec<usize>>> {
        let column = self.column(key_column)?;
        let mut groups: BTreeMap<CohortKey, Vec<usize>> = BTreeMap::new();
        for row in 0..self.n_rows {
            if let Some(key) = column.key_at(row) {
                groups.entry(key).or_default().push(row);
            }
        }
        Ok(groups)
    }

    pub fn log_summary(&self) {
        log::info!(
            "Dataset: {} rows, {} columns ({} numeric)",
            self.n_rows,
            self.n_cols(),
            self.columns.iter().filter(|c| c.is_numeric()).count()
        );
    }
}

/// One row of a value-frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    /// `None` stands for missing cells.
    pub value: Option<CohortKey>,
    pub count: usize,
    pub fraction: f64,
}

/// Count every distinct value of `column`, missing cells included.
///
/// Values are sorted ascending with the missing bucket last.
pub fn value_counts(dataset: &Dataset, column: &str) -> Result<Vec<ValueCount>> {
    let col = dataset.column(column)?;
    let mut counts: BTreeMap<CohortKey, usize> = BTreeMap::new();
    let mut missing = 0usize;
    for row in 0..dataset.n_rows() {
        match col.key_at(row) {
            Some(key) => *counts.entry(key).or_insert(0) += 1,
            None => missing += 1,
        }
    }

    let total = dataset.n_rows().max(1) as f64;
    let mut table: Vec<ValueCount> = counts
        .into_iter()
        .map(|(key, count)| ValueCount {
            value: Some(key),
            count,
            fraction: count as f64 / total,
        })
        .collect();
    if missing > 0 {
        table.push(ValueCount {
            value: None,
            count: missing,
            fraction: missing as f64 / total,
        });
    }
    Ok(table)
}

/// Drop repeated names, keeping the first occurrence.
pub fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            (
                "safra".to_string(),
                Column::Categorical(
                    ["202302", "202301", "202302", "", "202301"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            ),
            (
                "x".to_string(),
                Column::Numeric(vec![1.0, 2.0, f64::NAN, 4.0, 5.0]),
            ),
            ("y".to_string(), Column::Numeric(vec![0.5, 0.1, 0.2, 0.3, 0.4])),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Dataset::new(vec![
            ("a".to_string(), Column::Numeric(vec![1.0, 2.0])),
            ("b".to_string(), Column::Numeric(vec![1.0])),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SelectionError::LengthMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = Dataset::new(vec![
            ("a".to_string(), Column::Numeric(vec![1.0])),
            ("a".to_string(), Column::Numeric(vec![2.0])),
        ])
        .unwrap_err();
        assert_eq!(err, SelectionError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn test_partition_skips_missing_keys() {
        let data = sample();
        let groups = data.partition_by("safra").unwrap();
        let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["202301", "202302"]);
        assert_eq!(groups.values().map(|r| r.len()).sum::<usize>(), 4);
    }

    #[test]
    fn test_signed_zero_keys_share_a_cohort() {
        let data = Dataset::new(vec![(
            "month".to_string(),
            Column::Numeric(vec![0.0, -0.0, 1.0, -0.0]),
        )])
        .unwrap();
        let groups = data.partition_by("month").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&CohortKey::Number(0.0)], vec![0, 1, 3]);
    }

    #[test]
    fn test_complete_view_drops_nan_rows() {
        let data = sample();
        let (view, dropped) = data
            .complete_numeric_view(&["x".to_string(), "y".to_string()])
            .unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(view.shape(), (4, 2));
        assert_eq!((view[(2, 0)], view[(2, 1)]), (4.0, 0.3));
    }

    #[test]
    fn test_numeric_lookup_errors() {
        let data = sample();
        assert_eq!(
            data.numeric_column("safra").unwrap_err(),
            SelectionError::NonNumericColumn("safra".to_string())
        );
        assert_eq!(
            data.numeric_column("nope").unwrap_err(),
            SelectionError::UnknownColumn("nope".to_string())
        );
        assert_eq!(data.numeric_column_names(), vec!["x", "y"]);
    }

    #[test]
    fn test_value_counts_puts_missing_last() {
        let data = sample();
        let table = value_counts(&data, "safra").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].count, 2);
        assert!(table[2].value.is_none());
        assert!((table.iter().map(|v| v.fraction).sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cohort_key_ordering() {
        assert!(CohortKey::Number(2.0) < CohortKey::Number(10.0));
        assert!(CohortKey::Text("10".into()) < CohortKey::Text("2".into()));
        assert!(CohortKey::Number(99.0) < CohortKey::Text("a".into()));
    }

    #[test]
    fn test_dedup_names_keeps_first() {
        let names: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup_names(&names), vec!["b", "a", "c"]);
    }
}
