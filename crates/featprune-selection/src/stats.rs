use std::cmp::Ordering;

use crate::error::{Result, SelectionError};
use crate::math::Array1;

/// Area under the ROC curve via the Mann-Whitney U statistic.
///
/// Tied scores receive their average rank, so a positive/negative tie counts
/// as half a correct ordering.
///
/// # Arguments
///
/// * `y_true` - `true` for positive instances.
/// * `y_score` - Predicted scores; higher means more likely positive.
///
/// # Returns
///
/// AUC in [0, 1]. Fails when the inputs differ in length, a score is NaN, or
/// only one class is present.
pub fn roc_auc(y_true: &[bool], y_score: &[f64]) -> Result<f64> {
    if y_true.len() != y_score.len() {
        return Err(SelectionError::LengthMismatch {
            expected: y_true.len(),
            found: y_score.len(),
        });
    }
    let nan_count = Array1::from_vec(y_score.to_vec()).count_nan();
    if nan_count > 0 {
        return Err(SelectionError::NaNFound(nan_count));
    }

    let n_pos = y_true.iter().filter(|&&t| t).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(SelectionError::DegenerateLabelSet);
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| y_score[a].partial_cmp(&y_score[b]).unwrap_or(Ordering::Equal));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && y_score[order[j]] == y_score[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie group
        let avg_rank = (i + j + 1) as f64 / 2.0;
        rank_sum_pos += avg_rank * order[i..j].iter().filter(|&&k| y_true[k]).count() as f64;
        i = j;
    }

    let (n_pos, n_neg) = (n_pos as f64, n_neg as f64);
    let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
    Ok(u / (n_pos * n_neg))
}

/// Gini = 2 * AUC - 1, in [-1, 1].
pub fn gini(y_true: &[bool], y_score: &[f64]) -> Result<f64> {
    Ok(2.0 * roc_auc(y_true, y_score)? - 1.0)
}

/// [`gini`] for integer labels with exactly two distinct values; the larger
/// one is the positive class (so 1/0 and 1/-1 both work).
pub fn gini_from_labels(labels: &[i32], y_score: &[f64]) -> Result<f64> {
    let mut classes: Vec<i32> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    match classes.as_slice() {
        [_, positive] => {
            let y_true: Vec<bool> = labels.iter().map(|l| l == positive).collect();
            gini(&y_true, y_score)
        }
        [] | [_] => Err(SelectionError::DegenerateLabelSet),
        _ => Err(SelectionError::InvalidParameter(format!(
            "expected two label classes, found {}",
            classes.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_ranking() {
        let y = [false, false, true, true];
        let s = [0.1, 0.2, 0.8, 0.9];
        assert!((gini(&y, &s).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_ranking() {
        let y = [true, true, false, false];
        let s = [0.1, 0.2, 0.8, 0.9];
        assert!((gini(&y, &s).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_ties_is_zero() {
        let y = [true, false, true, false, false];
        let s = [0.5; 5];
        assert!(gini(&y, &s).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_partial_ties_count_half() {
        // pairs (pos, neg): (0.7,0.3) win, (0.7,0.7) tie, (0.5,0.3) win, (0.5,0.7) loss
        let y = [true, true, false, false];
        let s = [0.7, 0.5, 0.3, 0.7];
        let auc = roc_auc(&y, &s).unwrap();
        assert!((auc - 2.5 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        assert_eq!(
            gini(&[true, true], &[0.1, 0.2]).unwrap_err(),
            SelectionError::DegenerateLabelSet
        );
        assert_eq!(
            gini_from_labels(&[0, 0, 0], &[0.1, 0.2, 0.3]).unwrap_err(),
            SelectionError::DegenerateLabelSet
        );
    }

    #[test]
    fn test_input_validation() {
        assert!(matches!(
            gini(&[true, false], &[0.1]),
            Err(SelectionError::LengthMismatch { .. })
        ));
        assert_eq!(
            gini(&[true, false], &[f64::NAN, 0.2]).unwrap_err(),
            SelectionError::NaNFound(1)
        );
        assert!(matches!(
            gini_from_labels(&[0, 1, 2], &[0.1, 0.2, 0.3]),
            Err(SelectionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_signed_labels() {
        let g = gini_from_labels(&[-1, 1, -1, 1], &[0.2, 0.9, 0.1, 0.6]).unwrap();
        assert!((g - 1.0).abs() < 1e-12);
    }
}
