//! Worker pool for dispatching grid points.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use sw_types::{config_error, internal_error, GridResult};
use tracing::debug;

use crate::grid::GridPoint;

/// Fixed-size pool of worker threads.
///
/// Jobs share nothing mutable, so any interleaving is acceptable; results
/// are still returned in grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    n_jobs: usize,
}

impl WorkerPool {
    pub fn new(n_jobs: usize) -> Self {
        Self { n_jobs: n_jobs.max(1) }
    }

    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// Number of workers for a batch of `tasks`, capped at the task count.
    pub fn workers_for(&self, tasks: usize) -> usize {
        self.n_jobs.min(tasks).max(1)
    }

    /// Apply `job` to every point. A single worker runs on the calling
    /// thread; otherwise a dedicated rayon pool is built for the batch.
    pub fn map<T, F>(&self, points: &[GridPoint], job: F) -> GridResult<Vec<T>>
    where
        T: Send,
        F: Fn(&GridPoint) -> T + Sync,
    {
        let workers = self.workers_for(points.len());
        debug!("Dispatching {} grid points to {} workers", points.len(), workers);

        if workers == 1 {
            return Ok(points.iter().map(job).collect());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sweep-worker-{i}"))
            .build()
            .map_err(|e| internal_error!("failed to build worker pool: {}", e))?;

        Ok(pool.install(|| points.par_iter().map(|point| job(point)).collect()))
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Resolve an `n_jobs` setting where negative values count back from the
/// number of CPUs (`-1` = all CPUs, `-2` = all but one).
pub(crate) fn resolve_n_jobs(n_jobs: i64) -> GridResult<usize> {
    if n_jobs == 0 {
        return Err(config_error!("n_jobs must not be 0"));
    }
    if n_jobs > 0 {
        return Ok(n_jobs as usize);
    }
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1) as i64;
    let resolved = cpus + 1 + n_jobs;
    if resolved < 1 {
        return Err(config_error!("n_jobs = {} leaves no workers on {} CPUs", n_jobs, cpus));
    }
    Ok(resolved as usize)
}
