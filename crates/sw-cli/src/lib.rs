//! # sw-cli
//!
//! Command line front end: argument parsing, logging setup, and the mapping
//! from flags onto a [`RunConfig`].

use std::path::PathBuf;

use clap::Parser;
use sw_search::RunConfig;
use tracing_subscriber::EnvFilter;

/// Run an exhaustive hyperparameter grid search, one model per grid point.
///
/// Models and per-model results are written to OUTPUT_DIR as they finish.
/// Re-running with the same OUTPUT_DIR skips every grid point whose result
/// file already exists, so an interrupted search picks up where it stopped.
#[derive(Debug, Clone, Parser)]
#[command(name = "sweep", version)]
pub struct Cli {
    /// Search definition (JSON): estimator file, param_grid, fit_params, scoring
    #[arg(env = "SWEEP_SEARCH_FILE")]
    pub search_file: PathBuf,

    /// Name of the target column
    #[arg(short, long, env = "SWEEP_TARGET")]
    pub target: String,

    /// Training data (CSV with a header row)
    #[arg(short = 'f', long, env = "SWEEP_TRAINING_FILE")]
    pub training_file: PathBuf,

    /// Directory for models and results
    #[arg(short, long, env = "SWEEP_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Validation data, same columns as the training data
    #[arg(short, long, env = "SWEEP_VALIDATION_FILE")]
    pub validation_file: Option<PathBuf>,

    /// Number of cross validation folds
    #[arg(short, long, env = "SWEEP_CROSS_VALIDATION")]
    pub cross_validation: Option<usize>,

    /// Shuffle rows with this seed before cutting cross validation folds
    #[arg(long, env = "SWEEP_SHUFFLE_SEED")]
    pub shuffle_seed: Option<u64>,

    /// Parallel jobs; -1 uses every CPU
    #[arg(short = 'j', long, default_value_t = 1, allow_negative_numbers = true, env = "SWEEP_N_JOBS")]
    pub n_jobs: i64,

    /// Log what would run without training or writing anything
    #[arg(long, env = "SWEEP_DRY_RUN")]
    pub dry_run: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.search_file, &self.target, &self.training_file, &self.output_dir)
            .with_n_jobs(self.n_jobs)
            .with_dry_run(self.dry_run);
        if let Some(path) = &self.validation_file {
            config = config.with_validation_file(path);
        }
        if let Some(folds) = self.cross_validation {
            config = config.with_cross_validation(folds);
        }
        if let Some(seed) = self.shuffle_seed {
            config = config.with_shuffle_seed(seed);
        }
        config
    }
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins when set and valid.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
