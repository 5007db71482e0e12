//! Search definition files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sw_types::{EstimatorSpec, GridError, GridResult, InputKind, ParamGrid, ParameterSet};

/// The search definition: which estimator to tune, over which grid, with
/// which fit options and metrics.
///
/// ```json
/// {
///     "estimator": "/path/to/estimator.json",
///     "param_grid": { "n_neighbors": [1, 5, 15], "weights": ["uniform", "distance"] },
///     "fit_params": {},
///     "scoring": ["accuracy", "f1"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDefinition {
    /// Path to an estimator file (see [`EstimatorSpec`]).
    pub estimator: PathBuf,
    pub param_grid: ParamGrid,
    #[serde(default)]
    pub fit_params: ParameterSet,
    #[serde(default)]
    pub scoring: Vec<String>,
}

impl SearchDefinition {
    pub fn load<P: AsRef<Path>>(path: P) -> GridResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GridError::MissingInput {
                what: InputKind::SearchFile,
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path)?;
        Self::parse(path, &raw)
    }

    /// Parse search file contents; `path` is only used for error messages.
    pub fn parse(path: &Path, raw: &str) -> GridResult<Self> {
        let invalid = |message: String| GridError::InvalidSearchDefinition {
            path: path.to_path_buf(),
            message,
        };

        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
        let fields = value
            .as_object()
            .ok_or_else(|| invalid("expected a JSON object".to_string()))?;

        for required in ["estimator", "param_grid"] {
            if !fields.contains_key(required) {
                tracing::error!("The search params file {} needs a \"{}\" field.", path.display(), required);
                return Err(invalid(format!("needs a \"{required}\" field")));
            }
        }

        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
    }
}

/// Read an estimator file.
pub fn load_estimator_spec<P: AsRef<Path>>(path: P) -> GridResult<EstimatorSpec> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(GridError::MissingInput {
            what: InputKind::EstimatorFile,
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
