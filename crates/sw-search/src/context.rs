use std::path::{Path, PathBuf};

use sw_data::OutputLayout;
use sw_types::{Dataset, Metric, ParameterSet};

/// Everything a job needs besides its own hyperparameters.
///
/// Built once by the orchestrator after validation and shared read-only
/// (behind an `Arc`) by every concurrently running job.
#[derive(Debug, Clone)]
pub struct GridSearchContext {
    pub training: Dataset,
    pub training_file: PathBuf,
    pub target: String,
    pub validation: Option<Dataset>,
    pub validation_file: Option<PathBuf>,
    pub fit_params: ParameterSet,
    pub metrics: Vec<Metric>,
    /// Number of cross-validation folds, `None` to skip cross-validation.
    pub cross_validation: Option<usize>,
    /// Shuffle rows before splitting into folds.
    pub shuffle_seed: Option<u64>,
    pub layout: OutputLayout,
}

impl GridSearchContext {
    pub fn new<P: AsRef<Path>>(training: Dataset, training_file: P, target: &str, layout: OutputLayout) -> Self {
        Self {
            training,
            training_file: training_file.as_ref().to_path_buf(),
            target: target.to_string(),
            validation: None,
            validation_file: None,
            fit_params: ParameterSet::new(),
            metrics: Vec::new(),
            cross_validation: None,
            shuffle_seed: None,
            layout,
        }
    }

    pub fn with_validation<P: AsRef<Path>>(mut self, validation: Dataset, validation_file: P) -> Self {
        self.validation = Some(validation);
        self.validation_file = Some(validation_file.as_ref().to_path_buf());
        self
    }

    pub fn with_fit_params(mut self, fit_params: ParameterSet) -> Self {
        self.fit_params = fit_params;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cross_validation(mut self, folds: usize) -> Self {
        self.cross_validation = Some(folds);
        self
    }

    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }
}
