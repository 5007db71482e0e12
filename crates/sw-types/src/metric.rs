//! The closed set of metric names a grid search can be scored with.

use serde::{Deserialize, Serialize};

use crate::errors::{GridError, GridResult};

/// Supported scoring functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    F1,
    F1Micro,
    F1Macro,
    Precision,
    PrecisionMicro,
    PrecisionMacro,
    Recall,
    RecallMicro,
    RecallMacro,
    LogLoss,
    RocAuc,
    AveragePrecision,
    NegMeanAbsoluteError,
    NegMeanSquaredError,
    NegMedianAbsoluteError,
    R2,
}

impl Metric {
    pub const ALL: [Metric; 17] = [
        Metric::Accuracy,
        Metric::F1,
        Metric::F1Micro,
        Metric::F1Macro,
        Metric::Precision,
        Metric::PrecisionMicro,
        Metric::PrecisionMacro,
        Metric::Recall,
        Metric::RecallMicro,
        Metric::RecallMacro,
        Metric::LogLoss,
        Metric::RocAuc,
        Metric::AveragePrecision,
        Metric::NegMeanAbsoluteError,
        Metric::NegMeanSquaredError,
        Metric::NegMedianAbsoluteError,
        Metric::R2,
    ];

    /// The name used in search files and as a result-field suffix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::F1 => "f1",
            Self::F1Micro => "f1_micro",
            Self::F1Macro => "f1_macro",
            Self::Precision => "precision",
            Self::PrecisionMicro => "precision_micro",
            Self::PrecisionMacro => "precision_macro",
            Self::Recall => "recall",
            Self::RecallMicro => "recall_micro",
            Self::RecallMacro => "recall_macro",
            Self::LogLoss => "log_loss",
            Self::RocAuc => "roc_auc",
            Self::AveragePrecision => "average_precision",
            Self::NegMeanAbsoluteError => "neg_mean_absolute_error",
            Self::NegMeanSquaredError => "neg_mean_squared_error",
            Self::NegMedianAbsoluteError => "neg_median_absolute_error",
            Self::R2 => "r2",
        }
    }

    /// Metrics scored from class probabilities rather than hard predictions.
    pub fn needs_probabilities(&self) -> bool {
        matches!(self, Self::LogLoss | Self::RocAuc | Self::AveragePrecision)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|metric| metric.name() == name)
    }

    /// Parse every name, failing with all unrecognized names at once.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> GridResult<Vec<Metric>> {
        let mut metrics = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names {
            match Self::from_name(name.as_ref()) {
                Some(metric) => metrics.push(metric),
                None => unknown.push(name.as_ref().to_string()),
            }
        }

        if unknown.is_empty() {
            Ok(metrics)
        } else {
            Err(GridError::InvalidMetric { names: unknown })
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Metric {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| GridError::InvalidMetric {
            names: vec![s.to_string()],
        })
    }
}
