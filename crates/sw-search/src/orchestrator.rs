//! Grid search orchestration: validation, dispatch, consolidation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sw_data::{load_estimator_spec, OutputLayout, SearchDefinition, Table};
use sw_types::{
    config_error, Estimator, EstimatorRegistry, EstimatorSpec, GridError, GridResult, InputKind, Metric,
};
use tracing::{error, info};

use crate::consolidate::consolidate;
use crate::context::GridSearchContext;
use crate::cross_validation::KFold;
use crate::grid::{GridPoint, GridSearch};
use crate::job::{JobReport, JobRunner, JobStatus};
use crate::pool::{resolve_n_jobs, WorkerPool};

/// Configuration for one grid search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Search definition file (estimator, grid, fit params, metrics).
    pub search_file: PathBuf,

    /// Name of the target column in the training and validation files.
    pub target: String,

    pub training_file: PathBuf,

    /// Where models and results are written. Reused across runs to resume.
    pub output_dir: PathBuf,

    pub validation_file: Option<PathBuf>,

    /// Number of cross-validation folds.
    pub cross_validation: Option<usize>,

    /// Shuffle rows with this seed before cutting folds.
    pub shuffle_seed: Option<u64>,

    /// Parallel jobs. Negative values count back from the CPU count.
    pub n_jobs: i64,

    /// Validate and log the plan without training or writing anything.
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new<P, Q, R>(search_file: P, target: &str, training_file: Q, output_dir: R) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        Self {
            search_file: search_file.as_ref().to_path_buf(),
            target: target.to_string(),
            training_file: training_file.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            validation_file: None,
            cross_validation: None,
            shuffle_seed: None,
            n_jobs: 1,
            dry_run: false,
        }
    }

    pub fn with_validation_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.validation_file = Some(path.as_ref().to_path_buf());
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

    pub fn with_n_jobs(mut self, n_jobs: i64) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Builds a fresh, unfitted estimator for each job.
pub trait EstimatorFactory: Sync {
    fn create(&self) -> GridResult<Box<dyn Estimator>>;
}

impl<F> EstimatorFactory for F
where
    F: Fn() -> GridResult<Box<dyn Estimator>> + Sync,
{
    fn create(&self) -> GridResult<Box<dyn Estimator>> {
        self()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub trained: usize,
    pub skipped: usize,
    pub dry_run: bool,
    /// The consolidated results file, absent for dry runs.
    pub aggregate: Option<PathBuf>,
    pub reports: Vec<JobReport>,
}

impl RunSummary {
    fn planned(total: usize) -> Self {
        Self {
            total,
            trained: 0,
            skipped: 0,
            dry_run: true,
            aggregate: None,
            reports: Vec::new(),
        }
    }
}

/// A validated run, ready to execute.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub context: Arc<GridSearchContext>,
    pub points: Vec<GridPoint>,
    pub estimator: EstimatorSpec,
    pub n_jobs: usize,
}

impl PreparedRun {
    /// Log what a run would do. Touches nothing on disk.
    pub fn dry_run(&self) -> RunSummary {
        let context = &self.context;
        info!("Dry run: output_dir = {}", context.layout.dir.display());
        info!("Dry run: Models trained with fit params {}.", context.fit_params);
        let metrics: Vec<&str> = context.metrics.iter().map(Metric::name).collect();
        info!("Dry run: Models evaluated with metrics {}.", metrics.join(", "));
        if let Some(folds) = context.cross_validation {
            info!("Dry run: Models cross validated with {} folds.", folds);
        }
        if let Some(validation_file) = &context.validation_file {
            info!("Dry run: Models validated on {}.", validation_file.display());
        }
        for point in &self.points {
            info!("Dry run: Model {} trained and evaluated with {}.", point.model_id, point.params);
        }
        RunSummary::planned(self.points.len())
    }

    /// Run every grid point on the worker pool, then consolidate.
    ///
    /// Jobs whose result file already exists are skipped. If any job fails
    /// every failure is logged, consolidation is skipped so the completed
    /// per-job files stay behind as resume markers, and the failure with
    /// the lowest model id is returned.
    pub fn execute<F: EstimatorFactory>(&self, factory: &F) -> GridResult<RunSummary> {
        let context = self.context.as_ref();
        context.layout.ensure_dir()?;

        let runner = JobRunner::new(context)?;
        let pool = WorkerPool::new(self.n_jobs);
        info!(
            "Running {} models with {} workers into {}.",
            self.points.len(),
            pool.workers_for(self.points.len()),
            context.layout.dir.display()
        );

        let finished = pool.map(&self.points, |point| runner.run_and_report(point, || factory.create()))?;

        let mut reports = Vec::with_capacity(finished.len());
        let mut first_failure = None;
        for (report, outcome) in finished {
            if let Err(e) = outcome {
                error!("{}", e);
                first_failure.get_or_insert(e);
            }
            reports.push(report);
        }
        if let Some(e) = first_failure {
            let failed = reports.iter().filter(|r| r.status == JobStatus::Failed).count();
            error!("{} of {} models failed; results were not consolidated.", failed, reports.len());
            return Err(e);
        }

        let trained = reports.iter().filter(|r| r.status == JobStatus::Completed).count();
        let skipped = reports.iter().filter(|r| r.status == JobStatus::Skipped).count();
        info!("Trained {} models, skipped {} already complete.", trained, skipped);

        let consolidation = consolidate(&context.layout)?;
        Ok(RunSummary {
            total: self.points.len(),
            trained,
            skipped,
            dry_run: false,
            aggregate: Some(consolidation.aggregate),
            reports,
        })
    }
}

/// Runs grid searches with estimators resolved from a registry.
#[derive(Debug, Default)]
pub struct Orchestrator {
    registry: EstimatorRegistry,
}

impl Orchestrator {
    pub fn new(registry: EstimatorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EstimatorRegistry {
        &self.registry
    }

    /// Validate a run end to end and load everything it needs.
    ///
    /// Nothing is created on disk here: every input problem surfaces before
    /// the output directory exists.
    pub fn prepare(&self, config: &RunConfig) -> GridResult<PreparedRun> {
        require_file(InputKind::SearchFile, &config.search_file)?;
        require_file(InputKind::TrainingFile, &config.training_file)?;
        if let Some(validation_file) = &config.validation_file {
            require_file(InputKind::ValidationFile, validation_file)?;
        }

        let search = SearchDefinition::load(&config.search_file)?;

        let training = Table::load_csv(&config.training_file)?;
        if !training.has_column(&config.target) {
            return Err(GridError::schema(format!(
                "target column {} not in training file {}",
                config.target,
                config.training_file.display()
            )));
        }
        let validation = match &config.validation_file {
            Some(path) => {
                let table = Table::load_csv(path)?;
                if !table.has_column(&config.target) {
                    return Err(GridError::schema(format!(
                        "target column {} not in validation file {}",
                        config.target,
                        path.display()
                    )));
                }
                check_same_columns(&training, &table)?;
                Some(table)
            }
            None => None,
        };

        let metrics = Metric::parse_all(&search.scoring)?;

        if let Some(folds) = config.cross_validation {
            KFold::new(folds)?;
            if folds > training.rows.len() {
                return Err(config_error!(
                    "{} cross validation folds but the training file has {} rows",
                    folds,
                    training.rows.len()
                ));
            }
        }
        let n_jobs = resolve_n_jobs(config.n_jobs)?;

        let estimator = load_estimator_spec(&search.estimator)?;
        self.registry.build(&estimator)?;

        if search.param_grid.size().is_none() {
            return Err(config_error!("parameter grid in {} is too large", config.search_file.display()));
        }
        let grid = GridSearch::new(&search.param_grid);

        let feature_columns = training.feature_columns(&config.target);
        let training_data = training.split(&config.target, &feature_columns)?;
        let mut context = GridSearchContext::new(
            training_data,
            &config.training_file,
            &config.target,
            OutputLayout::new(&config.output_dir),
        )
        .with_fit_params(search.fit_params)
        .with_metrics(metrics);
        if let (Some(table), Some(path)) = (&validation, &config.validation_file) {
            context = context.with_validation(table.split(&config.target, &feature_columns)?, path);
        }
        if let Some(folds) = config.cross_validation {
            context = context.with_cross_validation(folds);
        }
        if let Some(seed) = config.shuffle_seed {
            context = context.with_shuffle_seed(seed);
        }

        info!(
            "Grid search over {} models with a {} estimator.",
            grid.len(),
            estimator.kind
        );
        Ok(PreparedRun {
            context: Arc::new(context),
            points: grid.into_points(),
            estimator,
            n_jobs,
        })
    }

    /// Validate, then either log the plan (dry run) or execute it with
    /// estimators built from the registry.
    pub fn run(&self, config: &RunConfig) -> GridResult<RunSummary> {
        let prepared = self.prepare(config)?;
        if config.dry_run {
            return Ok(prepared.dry_run());
        }

        let spec = prepared.estimator.clone();
        let factory = || self.registry.build(&spec);
        prepared.execute(&factory)
    }
}

fn require_file(what: InputKind, path: &Path) -> GridResult<()> {
    if path.exists() {
        return Ok(());
    }
    error!("{} {} does not exist.", what, path.display());
    Err(GridError::MissingInput {
        what,
        path: path.to_path_buf(),
    })
}

/// Training and validation must have the same columns, in any order.
fn check_same_columns(training: &Table, validation: &Table) -> GridResult<()> {
    let train_cols: BTreeSet<&str> = training.columns.iter().map(String::as_str).collect();
    let validation_cols: BTreeSet<&str> = validation.columns.iter().map(String::as_str).collect();
    if train_cols == validation_cols {
        return Ok(());
    }

    let missing: Vec<&str> = train_cols.difference(&validation_cols).copied().collect();
    let extra: Vec<&str> = validation_cols.difference(&train_cols).copied().collect();
    Err(GridError::schema(format!(
        "validation file {} columns differ from training file {}: missing [{}], unexpected [{}]",
        validation.path.display(),
        training.path.display(),
        missing.join(", "),
        extra.join(", ")
    )))
}
