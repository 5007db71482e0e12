//! Metrics computed from predicted probabilities.

use sw_types::{EstimatorError, GridResult};

const LOG_LOSS_EPS: f64 = 1e-15;

fn scoring_error(metric: &str, message: impl Into<String>) -> sw_types::GridError {
    EstimatorError::Scoring {
        metric: metric.to_string(),
        message: message.into(),
    }
    .into()
}

/// Mean cross-entropy of the true labels under `proba`, whose columns follow
/// `classes`. Probabilities are clipped away from 0 and 1 and each row is
/// renormalized.
pub fn log_loss(y_true: &[f64], classes: &[f64], proba: &[Vec<f64>]) -> GridResult<f64> {
    if y_true.len() != proba.len() {
        return Err(scoring_error(
            "log_loss",
            format!("{} labels but {} probability rows", y_true.len(), proba.len()),
        ));
    }
    if y_true.is_empty() {
        return Err(scoring_error("log_loss", "no rows to score"));
    }

    let mut total = 0.0;
    for (label, row) in y_true.iter().zip(proba) {
        let column = classes
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| scoring_error("log_loss", format!("label {label} was not seen during fit")))?;
        let clipped: Vec<f64> = row
            .iter()
            .map(|p| p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS))
            .collect();
        let norm: f64 = clipped.iter().sum();
        let p = clipped.get(column).copied().unwrap_or(LOG_LOSS_EPS) / norm;
        total -= p.ln();
    }

    Ok(total / y_true.len() as f64)
}

/// Area under the ROC curve for binary targets (positive label `1`), computed
/// from average ranks so tied scores count half.
pub fn roc_auc(y_true: &[f64], scores: &[f64]) -> GridResult<f64> {
    let n_pos = y_true.iter().filter(|&&y| y == 1.0).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(scoring_error(
            "roc_auc",
            "only one class present in the true labels",
        ));
    }

    let ranks = average_ranks(scores);
    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y == 1.0)
        .map(|(_, &r)| r)
        .sum();

    let n_pos = n_pos as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

/// 1-based ranks, ties sharing the mean of the ranks they span.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Average precision: the sum over score thresholds of precision weighted by
/// the recall gained at that threshold.
pub fn average_precision(y_true: &[f64], scores: &[f64]) -> GridResult<f64> {
    let total_pos = y_true.iter().filter(|&&y| y == 1.0).count();
    if total_pos == 0 {
        return Err(scoring_error(
            "average_precision",
            "no positive labels in the true labels",
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut prev_recall = 0.0;
    let mut ap = 0.0;
    let mut i = 0;
    while i < order.len() {
        // Consume every row sharing this threshold before scoring it.
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y_true[order[i]] == 1.0 {
                tp += 1;
            }
            seen += 1;
            i += 1;
        }
        let precision = tp as f64 / seen as f64;
        let recall = tp as f64 / total_pos as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }

    Ok(ap)
}
