//! Label-based classification metrics.

use sw_types::{EstimatorError, GridResult};

/// Precision, recall and F1 for one averaging scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecallF1 {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl PrecisionRecallF1 {
    fn from_counts(tp: f64, fp: f64, fn_: f64) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = ratio(2.0 * precision * recall, precision + recall);
        Self {
            precision,
            recall,
            f1,
        }
    }
}

/// Ill-defined ratios (empty denominator) score zero.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Fraction of rows where the prediction equals the label.
pub fn accuracy(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    ratio(correct as f64, y_true.len() as f64)
}

/// Sorted distinct labels appearing in either vector.
fn labels(y_true: &[f64], y_pred: &[f64]) -> Vec<f64> {
    let mut labels: Vec<f64> = y_true.iter().chain(y_pred).copied().collect();
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup();
    labels
}

/// (true positives, false positives, false negatives) treating `label` as positive.
fn counts_for(label: f64, y_true: &[f64], y_pred: &[f64]) -> (f64, f64, f64) {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == label, p == label) {
            (true, true) => tp += 1.0,
            (false, true) => fp += 1.0,
            (true, false) => fn_ += 1.0,
            (false, false) => {}
        }
    }
    (tp, fp, fn_)
}

/// Binary scores with positive label `1`. More than two distinct labels is
/// an error.
pub fn binary_scores(y_true: &[f64], y_pred: &[f64]) -> GridResult<PrecisionRecallF1> {
    let seen = labels(y_true, y_pred);
    if seen.len() > 2 {
        return Err(EstimatorError::Scoring {
            metric: "binary".to_string(),
            message: format!("target is multiclass ({} labels), use a _micro or _macro variant", seen.len()),
        }
        .into());
    }

    let (tp, fp, fn_) = counts_for(1.0, y_true, y_pred);
    Ok(PrecisionRecallF1::from_counts(tp, fp, fn_))
}

/// Scores from counts pooled over every label.
pub fn micro_scores(y_true: &[f64], y_pred: &[f64]) -> PrecisionRecallF1 {
    let (tp, fp, fn_) = labels(y_true, y_pred)
        .into_iter()
        .map(|label| counts_for(label, y_true, y_pred))
        .fold((0.0, 0.0, 0.0), |acc, c| (acc.0 + c.0, acc.1 + c.1, acc.2 + c.2));
    PrecisionRecallF1::from_counts(tp, fp, fn_)
}

/// Unweighted mean of the per-label scores.
pub fn macro_scores(y_true: &[f64], y_pred: &[f64]) -> PrecisionRecallF1 {
    let per_label: Vec<PrecisionRecallF1> = labels(y_true, y_pred)
        .into_iter()
        .map(|label| {
            let (tp, fp, fn_) = counts_for(label, y_true, y_pred);
            PrecisionRecallF1::from_counts(tp, fp, fn_)
        })
        .collect();

    let n = per_label.len() as f64;
    PrecisionRecallF1 {
        precision: ratio(per_label.iter().map(|s| s.precision).sum(), n),
        recall: ratio(per_label.iter().map(|s| s.recall).sum(), n),
        f1: ratio(per_label.iter().map(|s| s.f1).sum(), n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[0.0, 1.0, 1.0, 0.0], &[0.0, 1.0, 0.0, 0.0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn binary_scores_use_label_one() {
        // tp = 2, fp = 1, fn = 1
        let scores = binary_scores(&[1.0, 1.0, 1.0, 0.0, 0.0], &[1.0, 1.0, 0.0, 1.0, 0.0]).unwrap();
        assert!(close(scores.precision, 2.0 / 3.0));
        assert!(close(scores.recall, 2.0 / 3.0));
        assert!(close(scores.f1, 2.0 / 3.0));
    }

    #[test]
    fn binary_scores_reject_multiclass() {
        assert!(binary_scores(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).is_err());
    }

    #[test]
    fn no_predicted_positives_scores_zero_precision() {
        let scores = binary_scores(&[1.0, 0.0], &[0.0, 0.0]).unwrap();
        assert_eq!(scores.precision, 0.0);
        assert_eq!(scores.f1, 0.0);
    }

    #[test]
    fn micro_equals_accuracy_for_single_label_targets() {
        let y_true = [0.0, 1.0, 2.0, 2.0, 1.0];
        let y_pred = [0.0, 2.0, 2.0, 1.0, 1.0];
        let micro = micro_scores(&y_true, &y_pred);
        assert!(close(micro.f1, accuracy(&y_true, &y_pred)));
        assert!(close(micro.precision, micro.recall));
    }

    #[test]
    fn macro_averages_per_label_scores() {
        // label 0: p=1, r=1; label 1: p=0.5, r=1; label 2: p=0, r=0
        let y_true = [0.0, 1.0, 2.0];
        let y_pred = [0.0, 1.0, 1.0];
        let scores = macro_scores(&y_true, &y_pred);
        assert!(close(scores.precision, 0.5));
        assert!(close(scores.recall, 2.0 / 3.0));
        assert!(close(scores.f1, (1.0 + 2.0 / 3.0) / 3.0));
    }
}
