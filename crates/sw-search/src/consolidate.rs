//! Merging per-job result files into the aggregate.

use std::fs;
use std::path::PathBuf;

use sw_data::{write_atomic, OutputLayout};
use sw_types::{DataError, GridResult};
use tracing::{error, info};

/// What a consolidation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consolidation {
    pub aggregate: PathBuf,
    /// Number of per-job files folded into the aggregate.
    pub merged: usize,
}

/// Concatenate every `results_{id}.json` (in model id order) into
/// `results.json`, then delete the per-job files.
///
/// When no per-job files exist the aggregate is left as it is, so running
/// this twice in a row changes nothing the second time. The aggregate is
/// written in full before any per-job file is removed. An empty per-job
/// file is an error and leaves every file where it was.
pub fn consolidate(layout: &OutputLayout) -> GridResult<Consolidation> {
    let aggregate = layout.aggregate_path();
    let files = layout.result_files()?;

    if files.is_empty() {
        info!("No per-model results to consolidate in {}.", layout.dir.display());
        return Ok(Consolidation { aggregate, merged: 0 });
    }

    info!("Consolidating {} result files into {}.", files.len(), aggregate.display());
    let mut contents = String::new();
    for (model_id, path) in &files {
        let line = fs::read_to_string(path)?;
        if line.trim().is_empty() {
            error!("Result file for model {} is empty; nothing was consolidated.", model_id);
            return Err(DataError::LoadingFailed {
                message: format!("result file {} is empty", path.display()),
            }
            .into());
        }
        contents.push_str(&line);
        if !line.ends_with('\n') {
            contents.push('\n');
        }
    }
    write_atomic(&aggregate, contents.as_bytes())?;

    for (_, path) in &files {
        fs::remove_file(path)?;
    }

    Ok(Consolidation {
        aggregate,
        merged: files.len(),
    })
}
