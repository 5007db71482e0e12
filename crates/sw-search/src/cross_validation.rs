//! K-fold cross-validation.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use sw_types::{config_error, internal_error, Dataset, Estimator, GridResult, ModelId, ParameterSet, ResultRecord};
use tracing::info;

use crate::evaluator::Evaluator;

/// Row indices of one train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splitter without stratification.
///
/// Without a seed the folds are contiguous runs of rows in file order and the
/// first `n % k` folds take one extra row. With a seed the row order is
/// shuffled once (ChaCha8, so a seed always gives the same folds) before
/// cutting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    shuffle_seed: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> GridResult<Self> {
        if n_splits < 2 {
            return Err(config_error!("cross validation needs at least 2 folds, got {}", n_splits));
        }
        Ok(Self {
            n_splits,
            shuffle_seed: None,
        })
    }

    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn split(&self, n_rows: usize) -> GridResult<Vec<Fold>> {
        if n_rows < self.n_splits {
            return Err(config_error!(
                "cannot split {} rows into {} cross validation folds",
                n_rows,
                self.n_splits
            ));
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        if let Some(seed) = self.shuffle_seed {
            order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        }

        let base = n_rows / self.n_splits;
        let extra = n_rows % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < extra);
            let end = start + size;
            let test = order[start..end].to_vec();
            let train = order[..start].iter().chain(&order[end..]).copied().collect();
            folds.push(Fold { train, test });
            start = end;
        }
        Ok(folds)
    }
}

/// Cross-validate `model` on `data`, refitting it for every fold.
///
/// Each fold record holds `cross_validation_training_time_total`, the
/// `cross_validation_training_*` fields scored on the fold's training rows,
/// and the `cross_validation_*` fields scored on its held-out rows. The
/// folds are then combined by [`aggregate_folds`].
pub fn cross_validate(
    model: &mut dyn Estimator,
    model_id: ModelId,
    data: &Dataset,
    fit_params: &ParameterSet,
    folds: &KFold,
    evaluator: &Evaluator,
) -> GridResult<ResultRecord> {
    let mut fold_records = Vec::with_capacity(folds.n_splits());

    for (fold_index, fold) in folds.split(data.n_rows())?.into_iter().enumerate() {
        let train = data.subset(&fold.train)?;
        let test = data.subset(&fold.test)?;

        info!(
            "Training model {} on cross validation training set {}/{}.",
            model_id,
            fold_index + 1,
            folds.n_splits()
        );
        let start = Instant::now();
        model.fit(&train, fit_params)?;
        let fit_seconds = start.elapsed().as_secs_f64();
        info!(
            "Completed training model {} on cross validation training set. Took {:.3} seconds.",
            model_id, fit_seconds
        );

        let training = evaluator.evaluate(model, &train, "cross_validation_training")?;
        let held_out = evaluator.evaluate(model, &test, "cross_validation")?;
        info!(
            "Completed evaluating model {} on cross validation test set. Took {:.3} seconds for {} records.",
            model_id,
            held_out.get_f64("cross_validation_total_prediction_time").unwrap_or_default(),
            test.n_rows()
        );

        let mut record = ResultRecord::new();
        record.insert("cross_validation_training_time_total", fit_seconds);
        record.overlay(training);
        record.overlay(held_out);
        fold_records.push(record);
    }

    info!("Cross validation for model {} completed.", model_id);
    aggregate_folds(&fold_records)
}

/// Combine per-fold records: every field `f` becomes `f_all`, the list of
/// per-fold values in fold order, and `f`, their arithmetic mean. All `_all`
/// fields come first, in the field order of the first fold.
pub fn aggregate_folds(folds: &[ResultRecord]) -> GridResult<ResultRecord> {
    let Some(first) = folds.first() else {
        return Err(internal_error!("no cross validation folds to aggregate"));
    };

    let mut columns: Vec<(&str, Vec<Value>)> = Vec::with_capacity(first.len());
    for field in first.fields() {
        let values = folds
            .iter()
            .map(|fold| match fold.get(field) {
                Some(value) if value.is_number() => Ok(value.clone()),
                _ => Err(internal_error!("cross validation fold is missing numeric field {}", field)),
            })
            .collect::<GridResult<Vec<Value>>>()?;
        columns.push((field, values));
    }

    let mut record = ResultRecord::new();
    for (field, values) in &columns {
        record.insert(format!("{field}_all"), values.clone());
    }
    for (field, values) in &columns {
        let sum: f64 = values.iter().filter_map(Value::as_f64).sum();
        record.insert(*field, sum / values.len() as f64);
    }
    Ok(record)
}
