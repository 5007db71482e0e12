//! # sw-search
//!
//! Grid search orchestration for Sweep.
//!
//! Turns a parameter grid plus a shared, read-only [`GridSearchContext`] into
//! one job per grid point. Each job cross-validates, trains and evaluates a
//! fresh estimator and persists its model and result record; a job whose
//! result file already exists is skipped, so interrupted runs resume where
//! they stopped. After every job has finished the per-job results are
//! consolidated into a single newline-delimited JSON file.

mod consolidate;
mod context;
mod cross_validation;
mod evaluator;
mod grid;
mod job;
mod orchestrator;
mod pool;
mod trainer;

pub use consolidate::{consolidate, Consolidation};
pub use context::GridSearchContext;
pub use cross_validation::{aggregate_folds, cross_validate, Fold, KFold};
pub use evaluator::Evaluator;
pub use grid::{GridPoint, GridSearch};
pub use job::{JobOutcome, JobReport, JobRunner, JobStatus};
pub use orchestrator::{EstimatorFactory, Orchestrator, PreparedRun, RunConfig, RunSummary};
pub use pool::WorkerPool;
pub use trainer::train;
