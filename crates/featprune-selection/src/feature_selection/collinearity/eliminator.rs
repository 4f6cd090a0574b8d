//! Iterative multicollinearity elimination.
//!
//! Each round recomputes the VIF of every surviving feature, removes the single
//! worst one if it exceeds the threshold, and stops when nothing exceeds it or
//! the round budget runs out. The loop is an explicit fold over
//! [`EliminationState`] driven by [`CollinearityEliminator::step`].

use serde::Serialize;

use crate::data_handling::{dedup_names, Dataset};
use crate::error::{ensure_finite, Result};
use crate::feature_selection::collinearity::vif::{rank_value, VifOptions, VifTable};

pub const DEFAULT_VIF_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EliminationState {
    pub survivors: Vec<String>,
    pub removed: Vec<String>,
    /// 1-based index of the next round to run.
    pub round: usize,
    /// Worst VIF seen in the latest round, `+inf` before the first one.
    pub max_vif: f64,
}

impl EliminationState {
    pub fn new(features: &[String]) -> Self {
        EliminationState {
            survivors: dedup_names(features),
            removed: Vec::new(),
            round: 1,
            max_vif: f64::INFINITY,
        }
    }
}

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A feature was removed and the budget allows another round.
    Continue(EliminationState),
    /// No surviving feature exceeds the threshold (or none are left).
    Converged(EliminationState),
    /// The round limit was reached; the last round's removal still happened.
    Exhausted(EliminationState),
}

impl Step {
    pub fn state(&self) -> &EliminationState {
        match self {
            Step::Continue(s) | Step::Converged(s) | Step::Exhausted(s) => s,
        }
    }

    pub fn into_state(self) -> EliminationState {
        match self {
            Step::Continue(s) | Step::Converged(s) | Step::Exhausted(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Step::Continue(_))
    }
}

/// What happened in one elimination round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub round: usize,
    pub worst_feature: String,
    pub worst_vif: f64,
    pub removed: bool,
    pub table: VifTable,
}

/// Progress hook, called once per round. It cannot influence the result.
pub trait EliminationObserver {
    fn on_round(&mut self, record: &RoundRecord);
}

impl<F: FnMut(&RoundRecord)> EliminationObserver for F {
    fn on_round(&mut self, record: &RoundRecord) {
        self(record)
    }
}

/// Logs each round at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl EliminationObserver for LogObserver {
    fn on_round(&mut self, record: &RoundRecord) {
        log::info!(
            "VIF round {}: worst '{}' = {:.3} over {} features{}",
            record.round,
            record.worst_feature,
            record.worst_vif,
            record.table.len(),
            if record.removed { " (removed)" } else { "" }
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EliminationReport {
    pub vif_threshold: f64,
    pub max_rounds: Option<usize>,
    /// Removed features, in removal order.
    pub removed: Vec<String>,
    pub survivors: Vec<String>,
    pub converged: bool,
    pub rounds: Vec<RoundRecord>,
}

/// Removes the worst VIF offender per round until none exceeds the threshold.
#[derive(Debug, Clone)]
pub struct CollinearityEliminator {
    vif_threshold: f64,
    max_rounds: Option<usize>,
    options: VifOptions,
}

impl CollinearityEliminator {
    /// Creates an eliminator with no round limit.
    ///
    /// # Arguments
    ///
    /// * `vif_threshold` - Features with a VIF strictly above this are removed.
    pub fn new(vif_threshold: f64) -> Result<Self> {
        ensure_finite("VIF threshold", vif_threshold)?;
        Ok(CollinearityEliminator {
            vif_threshold,
            max_rounds: None,
            options: VifOptions::default(),
        })
    }

    /// Limit the number of rounds after the first.
    ///
    /// The limit is checked after a round's removal, so `Some(n)` allows up to
    /// `n + 1` removals and `Some(0)` still performs one.
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_options(mut self, options: VifOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one round on `state`.
    ///
    /// # Returns
    ///
    /// The next step and, unless the survivor set was already empty, the
    /// record of the round.
    pub fn step(
        &self,
        data: &Dataset,
        mut state: EliminationState,
    ) -> Result<(Step, Option<RoundRecord>)> {
        let table = VifTable::compute(data, &state.survivors, self.options)?;
        let Some(worst) = table.worst().cloned() else {
            return Ok((Step::Converged(state), None));
        };

        state.max_vif = rank_value(worst.vif);
        let exceeds = state.max_vif > self.vif_threshold;
        if exceeds {
            state.survivors.retain(|f| *f != worst.feature);
            state.removed.push(worst.feature.clone());
        }

        let record = RoundRecord {
            round: state.round,
            worst_feature: worst.feature,
            worst_vif: worst.vif,
            removed: exceeds,
            table,
        };

        let step = if !exceeds {
            Step::Converged(state)
        } else if self.max_rounds.map_or(false, |limit| state.round > limit) {
            Step::Exhausted(state)
        } else {
            state.round += 1;
            Step::Continue(state)
        };
        Ok((step, Some(record)))
    }

    /// Run rounds until convergence or the round limit, reporting each round to `observer`.
    pub fn run_with_observer(
        &self,
        data: &Dataset,
        features: &[String],
        observer: &mut dyn EliminationObserver,
    ) -> Result<EliminationReport> {
        let mut state = EliminationState::new(features);
        let mut rounds = Vec::new();

        loop {
            let (step, record) = self.step(data, state)?;
            if let Some(record) = record {
                observer.on_round(&record);
                rounds.push(record);
            }
            if !step.is_terminal() {
                log::debug!(
                    "{} features remain after round {}",
                    step.state().survivors.len(),
                    rounds.len()
                );
                state = step.into_state();
                continue;
            }

            let converged = matches!(step, Step::Converged(_));
            let last = step.into_state();
            log::info!(
                "Collinearity elimination: removed {} features in {} rounds, {} remain",
                last.removed.len(),
                rounds.len(),
                last.survivors.len()
            );
            return Ok(EliminationReport {
                vif_threshold: self.vif_threshold,
                max_rounds: self.max_rounds,
                removed: last.removed,
                survivors: last.survivors,
                converged,
                rounds,
            });
        }
    }

    /// Run with the default [`LogObserver`].
    pub fn run(&self, data: &Dataset, features: &[String]) -> Result<EliminationReport> {
        self.run_with_observer(data, features, &mut LogObserver)
    }
}

/// List the features removed for multicollinearity, in removal order.
///
/// Convenience wrapper over [`CollinearityEliminator`].
pub fn drop_colinear_features(
    data: &Dataset,
    features: &[String],
    vif_threshold: f64,
    max_rounds: Option<usize>,
) -> Result<Vec<String>> {
    Ok(CollinearityEliminator::new(vif_threshold)?
        .with_max_rounds(max_rounds)
        .run(data, features)?
        .removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::Column;
    use crate::error::SelectionError;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    /// `a` and `b` are near-orthogonal, `c` and `d` are near copies of `a`.
    fn redundant() -> Dataset {
        let n = 40;
        let a: Vec<f64> = (0..n).map(|i| ((i * 7) % 11) as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| ((i * 5) % 13) as f64 - 0.3 * (i % 3) as f64).collect();
        let c: Vec<f64> = a.iter().enumerate().map(|(i, v)| v + 0.01 * (i % 4) as f64).collect();
        let d: Vec<f64> = a.iter().enumerate().map(|(i, v)| 2.0 * v - 0.02 * (i % 5) as f64).collect();
        Dataset::new(vec![
            ("a".to_string(), Column::Numeric(a)),
            ("b".to_string(), Column::Numeric(b)),
            ("c".to_string(), Column::Numeric(c)),
            ("d".to_string(), Column::Numeric(d)),
        ])
        .unwrap()
    }

    #[test]
    fn test_step_removes_worst_and_continues() {
        let data = redundant();
        let eliminator = CollinearityEliminator::new(10.0).unwrap();
        let state = EliminationState::new(&names(&["a", "b", "c", "d"]));
        let (step, record) = eliminator.step(&data, state).unwrap();
        let record = record.unwrap();
        assert!(record.removed);
        assert_eq!(record.round, 1);
        assert_eq!(record.table.len(), 4);
        assert_ne!(record.worst_feature, "b");

        let next = match step {
            Step::Continue(s) => s,
            other => panic!("expected Continue, got {:?}", other),
        };
        assert_eq!(next.round, 2);
        assert_eq!(next.removed, vec![record.worst_feature.clone()]);
        assert_eq!(next.survivors.len(), 3);
    }

    #[test]
    fn test_run_converges_below_threshold() {
        let data = redundant();
        let report = CollinearityEliminator::new(10.0)
            .unwrap()
            .run(&data, &names(&["a", "b", "c", "d"]))
            .unwrap();
        assert!(report.converged);
        assert_eq!(report.removed.len(), 2);
        assert!(report.survivors.contains(&"b".to_string()));
        let last = report.rounds.last().unwrap();
        assert!(!last.removed);
        assert!(last.worst_vif <= 10.0);
        assert_eq!(report.rounds.len(), 3);
    }

    #[test]
    fn test_zero_round_limit_still_removes_once() {
        let data = redundant();
        let removed = drop_colinear_features(&data, &names(&["a", "b", "c", "d"]), 10.0, Some(0)).unwrap();
        assert_eq!(removed.len(), 1);
    }

    #[test]
    fn test_round_limit_allows_one_extra_round() {
        let data = redundant();
        let report = CollinearityEliminator::new(1.0)
            .unwrap()
            .with_max_rounds(Some(1))
            .run(&data, &names(&["a", "b", "c", "d"]))
            .unwrap();
        assert_eq!(report.removed.len(), 2);
        assert!(!report.converged);
    }

    #[test]
    fn test_observer_sees_every_round() {
        let data = redundant();
        let mut seen = Vec::new();
        let mut observer = |r: &RoundRecord| seen.push((r.round, r.worst_feature.clone()));
        let report = CollinearityEliminator::new(10.0)
            .unwrap()
            .run_with_observer(&data, &names(&["a", "b", "c", "d"]), &mut observer)
            .unwrap();
        assert_eq!(seen.len(), report.rounds.len());
        assert_eq!(seen[0].0, 1);
    }

    #[test]
    fn test_exact_combination_drops_dependent_feature() {
        let a: Vec<f64> = (0..30).map(|i| ((i * 7) % 11) as f64).collect();
        let b: Vec<f64> = (0..30).map(|i| ((i * 5) % 13) as f64).collect();
        let c: Vec<f64> = a.iter().zip(&b).map(|(x, y)| 2.0 * x + 3.0 * y).collect();
        let data = Dataset::new(vec![
            ("a".to_string(), Column::Numeric(a)),
            ("b".to_string(), Column::Numeric(b)),
            ("c".to_string(), Column::Numeric(c)),
        ])
        .unwrap();

        let report = CollinearityEliminator::new(10.0)
            .unwrap()
            .run(&data, &names(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(report.removed, vec!["c"]);
        assert_eq!(report.survivors, vec!["a", "b"]);
        assert!(report.converged);
        assert!(report.rounds[1].worst_vif.is_finite());
    }

    #[test]
    fn test_empty_feature_set_is_noop() {
        let data = redundant();
        let report = CollinearityEliminator::new(10.0).unwrap().run(&data, &[]).unwrap();
        assert!(report.removed.is_empty());
        assert!(report.rounds.is_empty());
        assert!(report.converged);
    }

    #[test]
    fn test_non_finite_threshold_is_invalid() {
        assert!(matches!(
            CollinearityEliminator::new(f64::INFINITY),
            Err(SelectionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_categorical_feature_errors() {
        let data = Dataset::new(vec![
            ("a".to_string(), Column::Numeric(vec![1.0, 2.0])),
            ("s".to_string(), Column::Categorical(vec!["x".into(), "y".into()])),
        ])
        .unwrap();
        assert_eq!(
            drop_colinear_features(&data, &names(&["a", "s"]), 10.0, None).unwrap_err(),
            SelectionError::NonNumericColumn("s".to_string())
        );
    }
}
