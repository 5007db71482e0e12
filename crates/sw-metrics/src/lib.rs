//! # sw-metrics
//!
//! The metric function registry. Every [`Metric`] maps to one scoring
//! function with the shape `(model, data) -> score`, where greater is always
//! better: error metrics and log loss are reported negated.

mod classification;
mod probability;
mod regression;

pub use classification::{accuracy, binary_scores, macro_scores, micro_scores, PrecisionRecallF1};
pub use probability::{average_precision, log_loss, roc_auc};
pub use regression::{mean_absolute_error, mean_squared_error, median_absolute_error, r2};

use sw_types::{Dataset, Estimator, EstimatorError, GridResult, Metric};

/// Scores a fitted model against a dataset.
pub type Scorer = fn(&dyn Estimator, &Dataset) -> GridResult<f64>;

/// Look up the scoring function for `metric`.
pub fn scorer(metric: Metric) -> Scorer {
    match metric {
        Metric::Accuracy => |m, d| Ok(accuracy(&d.target, &m.predict(d)?)),
        Metric::F1 => |m, d| Ok(binary_scores(&d.target, &m.predict(d)?)?.f1),
        Metric::F1Micro => |m, d| Ok(micro_scores(&d.target, &m.predict(d)?).f1),
        Metric::F1Macro => |m, d| Ok(macro_scores(&d.target, &m.predict(d)?).f1),
        Metric::Precision => |m, d| Ok(binary_scores(&d.target, &m.predict(d)?)?.precision),
        Metric::PrecisionMicro => |m, d| Ok(micro_scores(&d.target, &m.predict(d)?).precision),
        Metric::PrecisionMacro => |m, d| Ok(macro_scores(&d.target, &m.predict(d)?).precision),
        Metric::Recall => |m, d| Ok(binary_scores(&d.target, &m.predict(d)?)?.recall),
        Metric::RecallMicro => |m, d| Ok(micro_scores(&d.target, &m.predict(d)?).recall),
        Metric::RecallMacro => |m, d| Ok(macro_scores(&d.target, &m.predict(d)?).recall),
        Metric::LogLoss => |m, d| {
            let classes = fitted_classes(m, Metric::LogLoss)?;
            Ok(-log_loss(&d.target, classes, &m.predict_proba(d)?)?)
        },
        Metric::RocAuc => |m, d| roc_auc(&d.target, &positive_scores(m, d, Metric::RocAuc)?),
        Metric::AveragePrecision => {
            |m, d| average_precision(&d.target, &positive_scores(m, d, Metric::AveragePrecision)?)
        }
        Metric::NegMeanAbsoluteError => |m, d| Ok(-mean_absolute_error(&d.target, &m.predict(d)?)),
        Metric::NegMeanSquaredError => |m, d| Ok(-mean_squared_error(&d.target, &m.predict(d)?)),
        Metric::NegMedianAbsoluteError => |m, d| Ok(-median_absolute_error(&d.target, &m.predict(d)?)),
        Metric::R2 => |m, d| Ok(r2(&d.target, &m.predict(d)?)),
    }
}

/// Score `model` on `data` for a single metric.
pub fn score(metric: Metric, model: &dyn Estimator, data: &Dataset) -> GridResult<f64> {
    scorer(metric)(model, data)
}

fn fitted_classes(model: &dyn Estimator, metric: Metric) -> GridResult<&[f64]> {
    model.classes().ok_or_else(|| {
        EstimatorError::Scoring {
            metric: metric.name().to_string(),
            message: format!("{} does not expose class labels", model.kind()),
        }
        .into()
    })
}

/// Probability of the positive class (label `1`) for every row.
fn positive_scores(model: &dyn Estimator, data: &Dataset, metric: Metric) -> GridResult<Vec<f64>> {
    let classes = fitted_classes(model, metric)?;
    let column = classes
        .iter()
        .position(|&c| c == 1.0)
        .ok_or_else(|| EstimatorError::Scoring {
            metric: metric.name().to_string(),
            message: "positive label 1 was not seen during fit".to_string(),
        })?;

    Ok(model
        .predict_proba(data)?
        .into_iter()
        .map(|row| row.get(column).copied().unwrap_or(0.0))
        .collect())
}
