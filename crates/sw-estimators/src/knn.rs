//! k-nearest-neighbours classifier/regressor.

use serde::{Deserialize, Serialize};
use sw_types::{Dataset, Estimator, EstimatorError, GridResult, ParameterSet};
use tracing::debug;

use crate::params::{distinct, invalid, positive_int, reject_fit_params, string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnTask {
    Classification,
    Regression,
}

/// How neighbours are weighted in the vote/average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnWeights {
    Uniform,
    /// Inverse distance; exact matches take the whole vote.
    Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedKnn {
    features: Vec<Vec<f64>>,
    target: Vec<f64>,
    classes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNeighbors {
    n_neighbors: usize,
    weights: KnnWeights,
    /// Minkowski power: 1 = manhattan, 2 = euclidean.
    p: u32,
    task: KnnTask,
    fitted: Option<FittedKnn>,
}

impl Default for KNeighbors {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            weights: KnnWeights::Uniform,
            p: 2,
            task: KnnTask::Classification,
            fitted: None,
        }
    }
}

impl KNeighbors {
    pub const KIND: &'static str = "knn";

    pub fn new(n_neighbors: usize, task: KnnTask) -> Self {
        Self {
            n_neighbors,
            task,
            ..Self::default()
        }
    }

    pub fn build(params: &ParameterSet) -> GridResult<Box<dyn Estimator>> {
        let mut estimator = Self::default();
        estimator.set_params(params)?;
        Ok(Box::new(estimator))
    }

    fn fitted(&self) -> GridResult<&FittedKnn> {
        self.fitted.as_ref().ok_or_else(|| {
            EstimatorError::NotFitted {
                estimator: Self::KIND.to_string(),
            }
            .into()
        })
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self.p {
            1 => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            p => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs().powi(p as i32))
                .sum::<f64>()
                .powf(1.0 / p as f64),
        }
    }

    /// The k nearest training rows as (index, weight). Equal distances keep
    /// training order so predictions are deterministic.
    fn neighbours(&self, fitted: &FittedKnn, row: &[f64]) -> Vec<(usize, f64)> {
        let mut distances: Vec<(usize, f64)> = fitted
            .features
            .iter()
            .enumerate()
            .map(|(i, train_row)| (i, self.distance(row, train_row)))
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        distances.truncate(self.n_neighbors);

        match self.weights {
            KnnWeights::Uniform => distances.into_iter().map(|(i, _)| (i, 1.0)).collect(),
            KnnWeights::Distance => {
                if distances.iter().any(|(_, d)| *d == 0.0) {
                    distances
                        .into_iter()
                        .map(|(i, d)| (i, if d == 0.0 { 1.0 } else { 0.0 }))
                        .collect()
                } else {
                    distances.into_iter().map(|(i, d)| (i, 1.0 / d)).collect()
                }
            }
        }
    }

    fn class_votes(&self, fitted: &FittedKnn, row: &[f64]) -> Vec<f64> {
        let mut votes = vec![0.0; fitted.classes.len()];
        for (i, weight) in self.neighbours(fitted, row) {
            if let Some(slot) = fitted.classes.iter().position(|c| *c == fitted.target[i]) {
                votes[slot] += weight;
            }
        }
        votes
    }
}

impl Estimator for KNeighbors {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn set_params(&mut self, params: &ParameterSet) -> GridResult<()> {
        for (name, value) in params.iter() {
            match name {
                "n_neighbors" => self.n_neighbors = positive_int(Self::KIND, name, value)?,
                "p" => match value.as_i64() {
                    Some(p @ 1..=16) => self.p = p as u32,
                    _ => return Err(invalid(Self::KIND, name, format!("expected 1..=16, got {value}"))),
                },
                "weights" => {
                    self.weights = match string(Self::KIND, name, value)? {
                        "uniform" => KnnWeights::Uniform,
                        "distance" => KnnWeights::Distance,
                        other => return Err(invalid(Self::KIND, name, format!("unknown weighting {other}"))),
                    };
                }
                "task" => {
                    self.task = match string(Self::KIND, name, value)? {
                        "classification" => KnnTask::Classification,
                        "regression" => KnnTask::Regression,
                        other => return Err(invalid(Self::KIND, name, format!("unknown task {other}"))),
                    };
                }
                _ => return Err(invalid(Self::KIND, name, "unknown parameter")),
            }
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset, fit_params: &ParameterSet) -> GridResult<()> {
        reject_fit_params(Self::KIND, fit_params)?;
        if data.n_rows() < self.n_neighbors {
            return Err(EstimatorError::FitFailed {
                message: format!(
                    "n_neighbors = {} but only {} training rows",
                    self.n_neighbors,
                    data.n_rows()
                ),
            }
            .into());
        }

        debug!("Fitting knn on {} rows, k = {}", data.n_rows(), self.n_neighbors);
        self.fitted = Some(FittedKnn {
            features: data.features.clone(),
            target: data.target.clone(),
            classes: distinct(&data.target),
        });
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> GridResult<Vec<f64>> {
        let fitted = self.fitted()?;
        let predictions = data
            .features
            .iter()
            .map(|row| match self.task {
                KnnTask::Classification => {
                    let votes = self.class_votes(fitted, row);
                    // Ties go to the smallest label.
                    let mut best = 0;
                    for (slot, vote) in votes.iter().enumerate() {
                        if *vote > votes[best] {
                            best = slot;
                        }
                    }
                    fitted.classes.get(best).copied().unwrap_or_default()
                }
                KnnTask::Regression => {
                    let neighbours = self.neighbours(fitted, row);
                    let total: f64 = neighbours.iter().map(|(_, w)| w).sum();
                    neighbours
                        .iter()
                        .map(|(i, w)| fitted.target[*i] * w)
                        .sum::<f64>()
                        / total
                }
            })
            .collect();
        Ok(predictions)
    }

    fn classes(&self) -> Option<&[f64]> {
        match self.task {
            KnnTask::Classification => self.fitted.as_ref().map(|f| f.classes.as_slice()),
            KnnTask::Regression => None,
        }
    }

    fn predict_proba(&self, data: &Dataset) -> GridResult<Vec<Vec<f64>>> {
        if self.task == KnnTask::Regression {
            return Err(EstimatorError::Unsupported {
                estimator: Self::KIND.to_string(),
                capability: "predict_proba for regression".to_string(),
            }
            .into());
        }

        let fitted = self.fitted()?;
        Ok(data
            .features
            .iter()
            .map(|row| {
                let votes = self.class_votes(fitted, row);
                let total: f64 = votes.iter().sum();
                votes.into_iter().map(|v| v / total).collect()
            })
            .collect())
    }

    fn snapshot(&self) -> GridResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
