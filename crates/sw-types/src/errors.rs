use std::path::PathBuf;

use thiserror::Error;

use crate::params::ModelId;

/// Main error type for the Sweep system
#[derive(Error, Debug)]
pub enum GridError {
    #[error("{what} {} does not exist", .path.display())]
    MissingInput { what: InputKind, path: PathBuf },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Invalid search definition {}: {message}", .path.display())]
    InvalidSearchDefinition { path: PathBuf, message: String },

    #[error("{} are not available metrics", .names.join(" "))]
    InvalidMetric { names: Vec<String> },

    #[error("Model {model_id} failed: {source}")]
    JobFailure {
        model_id: ModelId,
        #[source]
        source: Box<GridError>,
    },

    #[error("Estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The user supplied inputs that must exist before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    SearchFile,
    TrainingFile,
    ValidationFile,
    EstimatorFile,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::SearchFile => "Search params file",
            Self::TrainingFile => "Training file",
            Self::ValidationFile => "Validation file",
            Self::EstimatorFile => "Estimator file",
        };
        f.write_str(label)
    }
}

/// Estimator-related errors
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Unknown estimator kind: {kind}")]
    UnknownKind { kind: String },

    #[error("Invalid parameter {parameter} for {estimator}: {message}")]
    InvalidParameter {
        estimator: String,
        parameter: String,
        message: String,
    },

    #[error("Estimator {estimator} has not been fitted")]
    NotFitted { estimator: String },

    #[error("Fit failed: {message}")]
    FitFailed { message: String },

    #[error("Prediction failed: {message}")]
    PredictionFailed { message: String },

    #[error("{estimator} does not support {capability}")]
    Unsupported {
        estimator: String,
        capability: String,
    },

    #[error("Cannot score {metric}: {message}")]
    Scoring { metric: String, message: String },
}

/// Data-related errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },

    #[error("Data parsing error at {} line {line}, column {column}: {message}", .path.display())]
    ParseError {
        path: PathBuf,
        line: u64,
        column: String,
        message: String,
    },

    #[error("Dataset is empty: {}", .path.display())]
    Empty { path: PathBuf },

    #[error("Row index {index} out of range for {rows} rows")]
    RowOutOfRange { index: usize, rows: usize },
}

/// Result type alias for Sweep operations
pub type GridResult<T> = Result<T, GridError>;

impl GridError {
    /// Wrap an error raised while running a single grid point.
    pub fn job(model_id: ModelId, source: GridError) -> Self {
        Self::JobFailure {
            model_id,
            source: Box::new(source),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::GridError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GridError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_metric_lists_every_name() {
        let error = GridError::InvalidMetric {
            names: vec!["bogus".to_string(), "nope".to_string()],
        };

        let text = error.to_string();
        assert!(text.contains("bogus"));
        assert!(text.contains("nope"));
    }

    #[test]
    fn test_missing_input_names_the_file() {
        let error = GridError::MissingInput {
            what: InputKind::TrainingFile,
            path: PathBuf::from("/tmp/train.csv"),
        };
        assert_eq!(error.to_string(), "Training file /tmp/train.csv does not exist");
    }

    #[test]
    fn test_error_conversion() {
        let estimator_error = EstimatorError::NotFitted {
            estimator: "knn".to_string(),
        };
        let grid_error: GridError = estimator_error.into();

        match grid_error {
            GridError::Estimator(_) => (),
            _ => panic!("Expected Estimator error"),
        }
    }

    #[test]
    fn test_job_failure_keeps_source() {
        let error = GridError::job(7, config_error!("bad folds: {}", 1));
        assert!(error.to_string().starts_with("Model 7 failed"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_macros() {
        let _internal_err = internal_error!("Something went wrong");
        let _config_err = config_error!("Missing required field: {}", "target");
    }
}
