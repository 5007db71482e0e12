//! In-memory feature matrices and target vectors.

use crate::errors::{DataError, GridResult};

/// A feature matrix with its target vector. Rows are stored row-major and
/// every row has one value per feature column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub target: Vec<f64>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, features: Vec<Vec<f64>>, target: Vec<f64>) -> GridResult<Self> {
        if features.len() != target.len() {
            return Err(DataError::LoadingFailed {
                message: format!(
                    "{} feature rows but {} target values",
                    features.len(),
                    target.len()
                ),
            }
            .into());
        }
        if let Some(row) = features.iter().position(|r| r.len() != feature_names.len()) {
            return Err(DataError::LoadingFailed {
                message: format!(
                    "row {row} has {} values, expected {}",
                    features[row].len(),
                    feature_names.len()
                ),
            }
            .into());
        }

        Ok(Self {
            feature_names,
            features,
            target,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Copy the given rows, in the given order, into a new dataset.
    pub fn subset(&self, rows: &[usize]) -> GridResult<Self> {
        let mut features = Vec::with_capacity(rows.len());
        let mut target = Vec::with_capacity(rows.len());
        for &index in rows {
            if index >= self.n_rows() {
                return Err(DataError::RowOutOfRange {
                    index,
                    rows: self.n_rows(),
                }
                .into());
            }
            features.push(self.features[index].clone());
            target.push(self.target[index]);
        }

        Ok(Self {
            feature_names: self.feature_names.clone(),
            features,
            target,
        })
    }
}
