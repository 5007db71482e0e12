//! The estimator abstraction the grid search drives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::errors::{EstimatorError, GridResult};
use crate::params::ParameterSet;

/// A trainable model.
///
/// The engine never looks inside an estimator: it applies hyperparameters,
/// fits, hands the fitted model to the metric functions and persists its
/// snapshot.
pub trait Estimator: Send + Sync {
    /// Registry key, also written into persisted model files.
    fn kind(&self) -> &str;

    /// Apply hyperparameters. Unknown names or bad values are an error.
    fn set_params(&mut self, params: &ParameterSet) -> GridResult<()>;

    /// Fit on `data`, replacing any previously fitted state.
    fn fit(&mut self, data: &Dataset, fit_params: &ParameterSet) -> GridResult<()>;

    /// One prediction per row of `data`.
    fn predict(&self, data: &Dataset) -> GridResult<Vec<f64>>;

    /// Class labels seen during fit, in the column order of `predict_proba`.
    fn classes(&self) -> Option<&[f64]> {
        None
    }

    /// Per-row class probabilities aligned with [`Estimator::classes`].
    fn predict_proba(&self, _data: &Dataset) -> GridResult<Vec<Vec<f64>>> {
        Err(EstimatorError::Unsupported {
            estimator: self.kind().to_string(),
            capability: "predict_proba".to_string(),
        }
        .into())
    }

    /// Serializable state written to the model file.
    fn snapshot(&self) -> GridResult<serde_json::Value>;
}

/// Contents of an estimator file: which estimator to build and its
/// starting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorSpec {
    pub kind: String,
    #[serde(default)]
    pub params: ParameterSet,
}

/// Builds an untrained estimator from its starting hyperparameters.
pub type EstimatorConstructor = fn(&ParameterSet) -> GridResult<Box<dyn Estimator>>;

/// Maps estimator kinds to constructors.
#[derive(Clone, Default)]
pub struct EstimatorRegistry {
    constructors: BTreeMap<String, EstimatorConstructor>,
}

impl std::fmt::Debug for EstimatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimatorRegistry")
            .field("kinds", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EstimatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, constructor: EstimatorConstructor) -> &mut Self {
        self.constructors.insert(kind.into(), constructor);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(&self, spec: &EstimatorSpec) -> GridResult<Box<dyn Estimator>> {
        let constructor = self
            .constructors
            .get(&spec.kind)
            .ok_or_else(|| EstimatorError::UnknownKind {
                kind: spec.kind.clone(),
            })?;
        constructor(&spec.params)
    }
}
