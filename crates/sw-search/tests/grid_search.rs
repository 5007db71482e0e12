use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use sw_data::OutputLayout;
use sw_estimators::{default_registry, DummyEstimator, DummyStrategy};
use sw_search::{consolidate, Orchestrator, RunConfig};
use sw_types::{Dataset, Estimator, EstimatorError, GridError, GridResult, ParameterSet};
use tempfile::{tempdir, TempDir};

/// Wraps a most-frequent baseline, counts fits, and accepts any
/// hyperparameters. Fails to fit `m = "b"` while `poisoned` is set.
struct Counting {
    inner: DummyEstimator,
    params: ParameterSet,
    fits: Arc<AtomicUsize>,
    poisoned: Arc<AtomicBool>,
}

impl Estimator for Counting {
    fn kind(&self) -> &str {
        "counting"
    }

    fn set_params(&mut self, params: &ParameterSet) -> GridResult<()> {
        for (name, value) in params.iter() {
            self.params.insert(name, value.clone());
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset, fit_params: &ParameterSet) -> GridResult<()> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        let wants_b = self.params.get("m").and_then(|v| v.as_str()) == Some("b");
        if wants_b && self.poisoned.load(Ordering::SeqCst) {
            return Err(EstimatorError::FitFailed {
                message: "poisoned".to_string(),
            }
            .into());
        }
        self.inner.fit(data, fit_params)
    }

    fn predict(&self, data: &Dataset) -> GridResult<Vec<f64>> {
        self.inner.predict(data)
    }

    fn classes(&self) -> Option<&[f64]> {
        self.inner.classes()
    }

    fn predict_proba(&self, data: &Dataset) -> GridResult<Vec<Vec<f64>>> {
        self.inner.predict_proba(data)
    }

    fn snapshot(&self) -> GridResult<Value> {
        Ok(json!({ "params": self.params, "inner": self.inner.snapshot()? }))
    }
}

struct Workspace {
    dir: TempDir,
    fits: Arc<AtomicUsize>,
    poisoned: Arc<AtomicBool>,
}

impl Workspace {
    fn new(scoring: &[&str]) -> Self {
        let dir = tempdir().unwrap();
        let estimator = dir.path().join("estimator.json");
        fs::write(&estimator, r#"{"kind": "dummy", "params": {"strategy": "most_frequent"}}"#).unwrap();

        let search = json!({
            "estimator": estimator,
            "param_grid": {"n": [1, 2], "m": ["a", "b"]},
            "scoring": scoring,
        });
        fs::write(dir.path().join("search.json"), search.to_string()).unwrap();
        fs::write(
            dir.path().join("train.csv"),
            "x,label\n0,0\n1,0\n2,1\n3,1\n4,1\n5,1\n",
        )
        .unwrap();
        fs::write(dir.path().join("validation.csv"), "label,x\n1,6\n0,7\n").unwrap();

        Self {
            dir,
            fits: Arc::new(AtomicUsize::new(0)),
            poisoned: Arc::new(AtomicBool::new(false)),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn output(&self) -> OutputLayout {
        OutputLayout::new(self.path("out"))
    }

    fn config(&self) -> RunConfig {
        RunConfig::new(self.path("search.json"), "label", self.path("train.csv"), self.path("out"))
    }

    fn run(&self, config: &RunConfig) -> GridResult<sw_search::RunSummary> {
        let prepared = Orchestrator::new(default_registry()).prepare(config)?;
        let factory = || -> GridResult<Box<dyn Estimator>> {
            Ok(Box::new(Counting {
                inner: DummyEstimator::new(DummyStrategy::MostFrequent),
                params: ParameterSet::new(),
                fits: Arc::clone(&self.fits),
                poisoned: Arc::clone(&self.poisoned),
            }))
        };
        prepared.execute(&factory)
    }

    fn fits(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }
}

fn aggregate_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_grid_order_and_record_contents() {
    let ws = Workspace::new(&["accuracy"]);
    let config = ws.config().with_validation_file(ws.path("validation.csv"));
    let summary = ws.run(&config).unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.trained, 4);
    assert_eq!(ws.fits(), 4);

    let records = aggregate_lines(&summary.aggregate.unwrap());
    let points: Vec<(Value, Value, Value)> = records
        .iter()
        .map(|r| (r["model_id"].clone(), r["n"].clone(), r["m"].clone()))
        .collect();
    assert_eq!(
        points,
        vec![
            (json!(0), json!(1), json!("a")),
            (json!(1), json!(1), json!("b")),
            (json!(2), json!(2), json!("a")),
            (json!(3), json!(2), json!("b")),
        ]
    );

    let first = &records[0];
    assert_eq!(first["target"], json!("label"));
    assert_eq!(first["training_accuracy"], json!(4.0 / 6.0));
    assert_eq!(first["training_total_prediction_records"], json!(6));
    assert_eq!(first["validation_accuracy"], json!(0.5));
    assert_eq!(first["validation_total_prediction_records"], json!(2));
    assert_eq!(
        first["validation_file"],
        json!(ws.path("validation.csv").display().to_string())
    );
    assert!(!first.as_object().unwrap().contains_key("cross_validation_accuracy"));
}

#[test]
fn test_result_implies_model() {
    let ws = Workspace::new(&["accuracy"]);
    let summary = ws.run(&ws.config()).unwrap();

    for record in aggregate_lines(&summary.aggregate.unwrap()) {
        let model_file = PathBuf::from(record["model_file"].as_str().unwrap());
        assert!(model_file.exists(), "{} is missing", model_file.display());

        let model: Value = serde_json::from_str(&fs::read_to_string(model_file).unwrap()).unwrap();
        assert_eq!(model["model_id"], record["model_id"]);
        assert_eq!(model["kind"], json!("counting"));
    }
}

#[test]
fn test_failed_job_resumes_without_retraining_finished_points() {
    let ws = Workspace::new(&["accuracy"]);
    ws.poisoned.store(true, Ordering::SeqCst);

    match ws.run(&ws.config()) {
        Err(GridError::JobFailure { model_id, .. }) => assert_eq!(model_id, 1),
        other => panic!("expected JobFailure, got {other:?}"),
    }
    let layout = ws.output();
    assert!(layout.is_complete(0));
    assert!(!layout.is_complete(1));
    assert!(layout.is_complete(2));
    assert!(!layout.is_complete(3));
    assert!(!layout.aggregate_path().exists());
    let first_pass = fs::read_to_string(layout.results_path(0)).unwrap();

    ws.poisoned.store(false, Ordering::SeqCst);
    let fits_before = ws.fits();
    let summary = ws.run(&ws.config()).unwrap();

    assert_eq!(ws.fits() - fits_before, 2);
    assert_eq!(summary.trained, 2);
    assert_eq!(summary.skipped, 2);

    let aggregate = fs::read_to_string(summary.aggregate.unwrap()).unwrap();
    assert_eq!(aggregate.lines().count(), 4);
    assert!(aggregate.starts_with(&first_pass));
}

#[test]
fn test_model_without_result_is_retrained() {
    let ws = Workspace::new(&["accuracy"]);
    let layout = ws.output();
    layout.ensure_dir().unwrap();
    // A job that stopped between writing its model and its result.
    fs::write(layout.model_path(1), "{\"model_id\":1,\"kind\":\"stale\"}").unwrap();
    for model_id in [0, 2, 3] {
        fs::write(layout.results_path(model_id), format!("{{\"model_id\":{model_id}}}\n")).unwrap();
    }

    let summary = ws.run(&ws.config()).unwrap();
    assert_eq!(summary.trained, 1);
    assert_eq!(summary.skipped, 3);
    assert_eq!(ws.fits(), 1);

    let model: Value = serde_json::from_str(&fs::read_to_string(layout.model_path(1)).unwrap()).unwrap();
    assert_eq!(model["kind"], json!("counting"));

    let records = aggregate_lines(&summary.aggregate.unwrap());
    let ids: Vec<Value> = records.iter().map(|r| r["model_id"].clone()).collect();
    assert_eq!(ids, vec![json!(0), json!(1), json!(2), json!(3)]);
    assert_eq!(records[1]["m"], json!("b"));
    assert!(records[1].as_object().unwrap().contains_key("training_accuracy"));
}

#[test]
fn test_complete_result_files_train_nothing() {
    let ws = Workspace::new(&["accuracy"]);
    let layout = ws.output();
    layout.ensure_dir().unwrap();
    let mut expected = String::new();
    for model_id in 0..4 {
        let line = format!("{{\"model_id\":{model_id}}}\n");
        fs::write(layout.results_path(model_id), &line).unwrap();
        expected.push_str(&line);
    }

    let summary = ws.run(&ws.config()).unwrap();
    assert_eq!(ws.fits(), 0);
    assert_eq!(summary.skipped, 4);
    assert_eq!(fs::read_to_string(layout.aggregate_path()).unwrap(), expected);
}

#[test]
fn test_cross_validation_lists_and_means() {
    let ws = Workspace::new(&["accuracy", "recall"]);
    let summary = ws.run(&ws.config().with_cross_validation(3)).unwrap();
    // Three folds plus the final fit, for each of the four points.
    assert_eq!(ws.fits(), 16);

    for record in aggregate_lines(&summary.aggregate.unwrap()) {
        for field in [
            "cross_validation_accuracy",
            "cross_validation_recall",
            "cross_validation_training_accuracy",
            "cross_validation_training_time_total",
            "cross_validation_total_prediction_records",
        ] {
            let all = record[format!("{field}_all")].as_array().unwrap();
            assert_eq!(all.len(), 3, "{field}_all");
            let mean = all.iter().map(|v| v.as_f64().unwrap()).sum::<f64>() / 3.0;
            assert!((record[field].as_f64().unwrap() - mean).abs() < 1e-9, "{field}");
        }
        assert_eq!(record["cross_validation_total_prediction_records_all"], json!([2, 2, 2]));
    }
}

#[test]
fn test_shuffled_folds_are_reproducible() {
    let ws = Workspace::new(&["accuracy"]);
    let config = ws.config().with_cross_validation(3).with_shuffle_seed(11);

    let first = aggregate_lines(&ws.run(&config).unwrap().aggregate.unwrap());
    let second = aggregate_lines(&ws.run(&config).unwrap().aggregate.unwrap());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a["cross_validation_accuracy_all"], b["cross_validation_accuracy_all"]);
    }
}

#[test]
fn test_parallel_run_matches_grid() {
    let ws = Workspace::new(&["accuracy"]);
    let summary = ws.run(&ws.config().with_n_jobs(3)).unwrap();
    assert_eq!(summary.trained, 4);

    let ids: Vec<Value> = aggregate_lines(&summary.aggregate.unwrap())
        .iter()
        .map(|r| r["model_id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(0), json!(1), json!(2), json!(3)]);
}

#[test]
fn test_consolidation_is_idempotent() {
    let ws = Workspace::new(&["accuracy"]);
    let summary = ws.run(&ws.config()).unwrap();
    let aggregate = summary.aggregate.unwrap();
    let before = fs::read(&aggregate).unwrap();

    let second = consolidate(&ws.output()).unwrap();
    assert_eq!(second.merged, 0);
    assert_eq!(fs::read(&aggregate).unwrap(), before);
}

#[test]
fn test_missing_target_fails_before_output_exists() {
    let ws = Workspace::new(&["accuracy"]);
    let config = RunConfig::new(ws.path("search.json"), "price", ws.path("train.csv"), ws.path("out"));

    assert!(matches!(ws.run(&config), Err(GridError::SchemaMismatch { .. })));
    assert!(!ws.path("out").exists());
    assert_eq!(ws.fits(), 0);
}

#[test]
fn test_unknown_metrics_listed_together() {
    let ws = Workspace::new(&["accuracy", "sharpe", "f2"]);
    match ws.run(&ws.config()) {
        Err(GridError::InvalidMetric { names }) => assert_eq!(names, vec!["sharpe", "f2"]),
        other => panic!("expected InvalidMetric, got {other:?}"),
    }
    assert!(!ws.path("out").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let ws = Workspace::new(&["accuracy"]);
    let config = ws.config().with_cross_validation(2).with_dry_run(true);
    let summary = Orchestrator::new(default_registry()).run(&config).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.total, 4);
    assert!(!ws.path("out").exists());
}
