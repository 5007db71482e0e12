//! Baseline estimator that ignores the features.

use serde::{Deserialize, Serialize};
use sw_types::{Dataset, Estimator, EstimatorError, GridResult, ParameterSet};

use crate::params::{distinct, invalid, number, reject_fit_params, string};

/// What a [`DummyEstimator`] predicts for every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DummyStrategy {
    /// Training target mean.
    Mean,
    /// Training target median.
    Median,
    /// Most frequent training label (smallest label on ties).
    MostFrequent,
    /// The `constant` hyperparameter.
    Constant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedDummy {
    prediction: f64,
    classes: Vec<f64>,
    priors: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyEstimator {
    strategy: DummyStrategy,
    constant: Option<f64>,
    fitted: Option<FittedDummy>,
}

impl DummyEstimator {
    pub const KIND: &'static str = "dummy";

    pub fn new(strategy: DummyStrategy) -> Self {
        Self {
            strategy,
            constant: None,
            fitted: None,
        }
    }

    pub fn build(params: &ParameterSet) -> GridResult<Box<dyn Estimator>> {
        let mut estimator = Self::new(DummyStrategy::Mean);
        estimator.set_params(params)?;
        Ok(Box::new(estimator))
    }

    fn fitted(&self) -> GridResult<&FittedDummy> {
        self.fitted.as_ref().ok_or_else(|| {
            EstimatorError::NotFitted {
                estimator: Self::KIND.to_string(),
            }
            .into()
        })
    }
}

impl Estimator for DummyEstimator {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn set_params(&mut self, params: &ParameterSet) -> GridResult<()> {
        for (name, value) in params.iter() {
            match name {
                "strategy" => {
                    self.strategy = match string(Self::KIND, name, value)? {
                        "mean" => DummyStrategy::Mean,
                        "median" => DummyStrategy::Median,
                        "most_frequent" => DummyStrategy::MostFrequent,
                        "constant" => DummyStrategy::Constant,
                        other => return Err(invalid(Self::KIND, name, format!("unknown strategy {other}"))),
                    };
                }
                "constant" => self.constant = Some(number(Self::KIND, name, value)?),
                _ => return Err(invalid(Self::KIND, name, "unknown parameter")),
            }
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset, fit_params: &ParameterSet) -> GridResult<()> {
        reject_fit_params(Self::KIND, fit_params)?;
        if data.is_empty() {
            return Err(EstimatorError::FitFailed {
                message: "cannot fit on an empty dataset".to_string(),
            }
            .into());
        }

        let classes = distinct(&data.target);
        let n = data.n_rows() as f64;
        let priors: Vec<f64> = classes
            .iter()
            .map(|c| data.target.iter().filter(|&&y| y == *c).count() as f64 / n)
            .collect();

        let prediction = match self.strategy {
            DummyStrategy::Mean => data.target.iter().sum::<f64>() / n,
            DummyStrategy::Median => {
                let mut sorted = data.target.clone();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            DummyStrategy::MostFrequent => {
                // max_by keeps the last maximum, so walk from the largest label down.
                classes
                    .iter()
                    .zip(&priors)
                    .rev()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(c, _)| *c)
                    .unwrap_or_default()
            }
            DummyStrategy::Constant => self
                .constant
                .ok_or_else(|| invalid(Self::KIND, "constant", "required by the constant strategy"))?,
        };

        self.fitted = Some(FittedDummy {
            prediction,
            classes,
            priors,
        });
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> GridResult<Vec<f64>> {
        Ok(vec![self.fitted()?.prediction; data.n_rows()])
    }

    fn classes(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.classes.as_slice())
    }

    fn predict_proba(&self, data: &Dataset) -> GridResult<Vec<Vec<f64>>> {
        Ok(vec![self.fitted()?.priors.clone(); data.n_rows()])
    }

    fn snapshot(&self) -> GridResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_types::ParameterValue;

    fn data(target: Vec<f64>) -> Dataset {
        let rows = target.iter().map(|_| vec![0.0]).collect();
        Dataset::new(vec!["x".into()], rows, target).unwrap()
    }

    fn strategy(name: &str) -> ParameterSet {
        ParameterSet::new().with("strategy", ParameterValue::Json(serde_json::json!(name)))
    }

    #[test]
    fn mean_and_median_strategies() {
        let train = data(vec![1.0, 2.0, 9.0]);
        let mut model = DummyEstimator::new(DummyStrategy::Mean);
        model.fit(&train, &ParameterSet::new()).unwrap();
        assert_eq!(model.predict(&train).unwrap(), vec![4.0; 3]);

        model.set_params(&strategy("median")).unwrap();
        model.fit(&train, &ParameterSet::new()).unwrap();
        assert_eq!(model.predict(&train).unwrap(), vec![2.0; 3]);
    }

    #[test]
    fn most_frequent_breaks_ties_towards_smaller_label() {
        let train = data(vec![1.0, 0.0, 1.0, 0.0, 2.0]);
        let mut model = DummyEstimator::new(DummyStrategy::MostFrequent);
        model.fit(&train, &ParameterSet::new()).unwrap();
        assert_eq!(model.predict(&data(vec![5.0])).unwrap(), vec![0.0]);
        assert_eq!(model.classes(), Some(&[0.0, 1.0, 2.0][..]));
        assert_eq!(model.predict_proba(&data(vec![5.0])).unwrap(), vec![vec![0.4, 0.4, 0.2]]);
    }

    #[test]
    fn constant_strategy_requires_constant() {
        let mut model = DummyEstimator::new(DummyStrategy::Mean);
        model.set_params(&strategy("constant")).unwrap();
        assert!(model.fit(&data(vec![1.0]), &ParameterSet::new()).is_err());

        model
            .set_params(&ParameterSet::new().with("constant", ParameterValue::Float(3.5)))
            .unwrap();
        model.fit(&data(vec![1.0]), &ParameterSet::new()).unwrap();
        assert_eq!(model.predict(&data(vec![0.0, 0.0])).unwrap(), vec![3.5, 3.5]);
    }

    #[test]
    fn unknown_parameters_are_rejected() {
        let mut model = DummyEstimator::new(DummyStrategy::Mean);
        assert!(model.set_params(&ParameterSet::new().with("depth", ParameterValue::Int(3))).is_err());
        assert!(model.set_params(&strategy("uniform")).is_err());
        assert!(model
            .fit(&data(vec![1.0]), &ParameterSet::new().with("sample_weight", ParameterValue::Int(1)))
            .is_err());
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = DummyEstimator::new(DummyStrategy::Mean);
        assert!(model.predict(&data(vec![1.0])).is_err());
    }
}
