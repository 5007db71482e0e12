//! Running a single grid point.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sw_types::{Estimator, GridError, GridResult, ModelId, ResultRecord};
use tracing::info;

use crate::context::GridSearchContext;
use crate::cross_validation::{cross_validate, KFold};
use crate::evaluator::Evaluator;
use crate::grid::GridPoint;
use crate::trainer::train;

/// What a job did.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The result file already existed; nothing was trained or written.
    Skipped,
    /// The model and the result record were written.
    Completed(ResultRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Skipped,
    Completed,
    Failed,
}

/// Bookkeeping for one job, collected by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub model_id: ModelId,
    pub status: JobStatus,
    pub duration_seconds: f64,
    pub error: Option<String>,
}

impl JobReport {
    pub fn new(model_id: ModelId) -> Self {
        Self {
            model_id,
            status: JobStatus::Pending,
            duration_seconds: 0.0,
            error: None,
        }
    }

    pub fn mark_skipped(&mut self) {
        self.status = JobStatus::Skipped;
    }

    pub fn mark_completed(&mut self, duration_seconds: f64) {
        self.status = JobStatus::Completed;
        self.duration_seconds = duration_seconds;
    }

    pub fn mark_failed(&mut self, duration_seconds: f64, error: String) {
        self.status = JobStatus::Failed;
        self.duration_seconds = duration_seconds;
        self.error = Some(error);
    }
}

/// Runs grid points against a shared context.
#[derive(Debug, Clone)]
pub struct JobRunner<'a> {
    context: &'a GridSearchContext,
    evaluator: Evaluator,
    folds: Option<KFold>,
}

impl<'a> JobRunner<'a> {
    pub fn new(context: &'a GridSearchContext) -> GridResult<Self> {
        let folds = context
            .cross_validation
            .map(|n| KFold::new(n).map(|k| k.with_shuffle(context.shuffle_seed)))
            .transpose()?;
        Ok(Self {
            context,
            evaluator: Evaluator::from_metrics(context.metrics.clone()),
            folds,
        })
    }

    /// Run one grid point.
    ///
    /// Skips without building a model when the point's result file exists.
    /// Otherwise cross-validates (if configured), trains on the full
    /// training set, evaluates on the validation set (if any), writes the
    /// model and then the result file. Any error is wrapped in
    /// [`GridError::JobFailure`] and leaves no result file behind.
    pub fn run<F>(&self, point: &GridPoint, make_model: F) -> GridResult<JobOutcome>
    where
        F: FnOnce() -> GridResult<Box<dyn Estimator>>,
    {
        info!("Training and evaluating model {}: {}", point.model_id, point.params);

        if self.context.layout.is_complete(point.model_id) {
            info!("Model {} already exists, skipping.", point.model_id);
            return Ok(JobOutcome::Skipped);
        }

        self.execute(point, make_model)
            .map(JobOutcome::Completed)
            .map_err(|e| GridError::job(point.model_id, e))
    }

    /// Run one grid point and record how it went.
    pub fn run_and_report<F>(&self, point: &GridPoint, make_model: F) -> (JobReport, GridResult<JobOutcome>)
    where
        F: FnOnce() -> GridResult<Box<dyn Estimator>>,
    {
        let mut report = JobReport::new(point.model_id);
        let start = Instant::now();
        let outcome = self.run(point, make_model);
        let elapsed = start.elapsed().as_secs_f64();

        match &outcome {
            Ok(JobOutcome::Skipped) => report.mark_skipped(),
            Ok(JobOutcome::Completed(_)) => report.mark_completed(elapsed),
            Err(e) => report.mark_failed(elapsed, e.to_string()),
        }
        (report, outcome)
    }

    fn execute<F>(&self, point: &GridPoint, make_model: F) -> GridResult<ResultRecord>
    where
        F: FnOnce() -> GridResult<Box<dyn Estimator>>,
    {
        let context = self.context;
        let model_id = point.model_id;
        let model_file = context.layout.model_path(model_id);

        let mut model = make_model()?;
        model.set_params(&point.params)?;

        let cv_results = match &self.folds {
            Some(folds) => {
                info!("Cross validating model {} for {} folds.", model_id, folds.n_splits());
                cross_validate(
                    model.as_mut(),
                    model_id,
                    &context.training,
                    &context.fit_params,
                    folds,
                    &self.evaluator,
                )?
            }
            None => ResultRecord::new(),
        };

        info!("Training model {} and evaluating the model on the training set.", model_id);
        let training_results = train(model.as_mut(), &context.training, &context.fit_params, &self.evaluator)?;
        info!(
            "Model {} trained in {:.3} seconds.",
            model_id,
            training_results.get_f64("training_time_total").unwrap_or_default()
        );
        info!(
            "Model {} training set prediction time: {:.3} for {} records.",
            model_id,
            training_results.get_f64("training_total_prediction_time").unwrap_or_default(),
            context.training.n_rows()
        );

        let validation_results = match &context.validation {
            Some(validation) => {
                info!("Evaluating model {} on the validation set.", model_id);
                let results = self.evaluator.evaluate(model.as_ref(), validation, "validation")?;
                info!(
                    "Model {} validation set evaluation time: {:.3} for {} records.",
                    model_id,
                    results.get_f64("validation_total_prediction_time").unwrap_or_default(),
                    validation.n_rows()
                );
                results
            }
            None => ResultRecord::new(),
        };

        let mut results = ResultRecord::new();
        results.insert("training_file", context.training_file.display().to_string());
        results.insert("target", context.target.as_str());
        results.insert("model_file", model_file.display().to_string());
        results.insert("model_id", model_id);
        results.overlay(cv_results);
        results.overlay(training_results);
        results.overlay(validation_results);
        results.overlay(point.params.iter().map(|(name, value)| (name.to_string(), value.to_json())).collect());
        if let Some(validation_file) = &context.validation_file {
            results.insert("validation_file", validation_file.display().to_string());
        }

        // The model goes first: a result file always has its model next to it.
        info!("Writing estimator for model {} to {}.", model_id, model_file.display());
        context.layout.write_model(model_id, model.as_ref())?;

        let results_file = context.layout.results_path(model_id);
        info!("Writing results for model {} to {}.", model_id, results_file.display());
        context.layout.write_result(model_id, &results)?;

        Ok(results)
    }
}
