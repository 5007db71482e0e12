use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sw_types::{Estimator, GridResult, ModelId, ResultRecord};

const RESULTS_PREFIX: &str = "results_";
const RESULTS_SUFFIX: &str = ".json";
const AGGREGATE_FILE: &str = "results.json";

/// File layout of a grid search output directory.
///
/// ```text
/// {dir}/model_{id}.json     fitted model, one per grid point
/// {dir}/results_{id}.json   one JSON line per grid point, the completion marker
/// {dir}/results.json        all result lines after consolidation
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    pub dir: PathBuf,
}

/// What gets written to a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub model_id: ModelId,
    pub kind: String,
    pub state: serde_json::Value,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Create the directory if needed. An existing directory is reused so
    /// partially completed runs can resume.
    pub fn ensure_dir(&self) -> GridResult<()> {
        if !self.dir.exists() {
            tracing::info!("{} does not exist. Creating {}.", self.dir.display(), self.dir.display());
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn model_path(&self, model_id: ModelId) -> PathBuf {
        self.dir.join(format!("model_{model_id}.json"))
    }

    pub fn results_path(&self, model_id: ModelId) -> PathBuf {
        self.dir.join(format!("{RESULTS_PREFIX}{model_id}{RESULTS_SUFFIX}"))
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.dir.join(AGGREGATE_FILE)
    }

    /// A grid point is complete exactly when its result file exists.
    pub fn is_complete(&self, model_id: ModelId) -> bool {
        self.results_path(model_id).exists()
    }

    pub fn write_model(&self, model_id: ModelId, model: &dyn Estimator) -> GridResult<PathBuf> {
        let path = self.model_path(model_id);
        let file = ModelFile {
            model_id,
            kind: model.kind().to_string(),
            state: model.snapshot()?,
        };
        write_atomic(&path, serde_json::to_string(&file)?.as_bytes())?;
        Ok(path)
    }

    pub fn read_model(&self, model_id: ModelId) -> GridResult<ModelFile> {
        let raw = fs::read_to_string(self.model_path(model_id))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the single-line result record. The file only appears once its
    /// content is complete.
    pub fn write_result(&self, model_id: ModelId, record: &ResultRecord) -> GridResult<PathBuf> {
        let path = self.results_path(model_id);
        write_atomic(&path, record.to_json_line()?.as_bytes())?;
        Ok(path)
    }

    /// Every per-job result file currently on disk, sorted by model id.
    /// Temporary files and the aggregate are ignored.
    pub fn result_files(&self) -> GridResult<Vec<(ModelId, PathBuf)>> {
        let mut found = Vec::new();
        if !self.dir.exists() {
            return Ok(found);
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(model_id) = parse_results_name(name) {
                found.push((model_id, path));
            }
        }

        found.sort_by_key(|(model_id, _)| *model_id);
        Ok(found)
    }
}

/// `results_{digits}.json` to the model id, anything else to `None`.
fn parse_results_name(name: &str) -> Option<ModelId> {
    let digits = name.strip_prefix(RESULTS_PREFIX)?.strip_suffix(RESULTS_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Write to a temporary sibling then rename over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> GridResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_are_keyed_by_model_id() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.model_path(3), PathBuf::from("/out/model_3.json"));
        assert_eq!(layout.results_path(3), PathBuf::from("/out/results_3.json"));
        assert_eq!(layout.aggregate_path(), PathBuf::from("/out/results.json"));
    }

    #[test]
    fn test_result_file_marks_completion() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        assert!(!layout.is_complete(0));

        let mut record = ResultRecord::new();
        record.insert("model_id", 0);
        layout.write_result(0, &record).unwrap();

        assert!(layout.is_complete(0));
        assert_eq!(fs::read_to_string(layout.results_path(0)).unwrap(), "{\"model_id\":0}\n");
        assert!(!dir.path().join("results_0.json.tmp").exists());
    }

    #[test]
    fn test_result_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        for name in [
            "results_10.json",
            "results_2.json",
            "results.json",
            "results_3.json.tmp",
            "results_x.json",
            "model_1.json",
        ] {
            fs::write(dir.path().join(name), "{}\n").unwrap();
        }

        let ids: Vec<ModelId> = layout.result_files().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 10]);
    }

    #[test]
    fn test_missing_dir_has_no_result_files() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("absent"));
        assert!(layout.result_files().unwrap().is_empty());
    }

    #[test]
    fn test_ensure_dir_reuses_existing() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("run"));
        layout.ensure_dir().unwrap();
        fs::write(layout.results_path(0), "{}\n").unwrap();
        layout.ensure_dir().unwrap();
        assert!(layout.is_complete(0));
    }
}
