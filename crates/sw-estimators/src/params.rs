//! Hyperparameter parsing shared by the baseline estimators.

use sw_types::{EstimatorError, GridError, ParameterSet, ParameterValue};

pub(crate) fn invalid(estimator: &str, parameter: &str, message: impl Into<String>) -> GridError {
    EstimatorError::InvalidParameter {
        estimator: estimator.to_string(),
        parameter: parameter.to_string(),
        message: message.into(),
    }
    .into()
}

pub(crate) fn positive_int(estimator: &str, parameter: &str, value: &ParameterValue) -> Result<usize, GridError> {
    match value.as_i64() {
        Some(v) if v >= 1 => Ok(v as usize),
        _ => Err(invalid(estimator, parameter, format!("expected a positive integer, got {value}"))),
    }
}

pub(crate) fn number(estimator: &str, parameter: &str, value: &ParameterValue) -> Result<f64, GridError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(estimator, parameter, format!("expected a number, got {value}")))
}

pub(crate) fn string<'a>(estimator: &str, parameter: &str, value: &'a ParameterValue) -> Result<&'a str, GridError> {
    value
        .as_str()
        .ok_or_else(|| invalid(estimator, parameter, format!("expected a string, got {value}")))
}

/// The baselines take no fit options; anything passed is a configuration
/// mistake worth surfacing.
pub(crate) fn reject_fit_params(estimator: &str, fit_params: &ParameterSet) -> Result<(), GridError> {
    match fit_params.iter().next() {
        Some((name, _)) => Err(invalid(estimator, name, "unsupported fit parameter")),
        None => Ok(()),
    }
}

/// Sorted distinct target values.
pub(crate) fn distinct(values: &[f64]) -> Vec<f64> {
    let mut classes = values.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}
