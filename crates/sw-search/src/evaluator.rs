use std::time::Instant;

use sw_types::{Dataset, Estimator, GridResult, Metric, ResultRecord};

/// Scores a fitted estimator against a dataset for a fixed set of metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    metrics: Vec<Metric>,
}

impl Evaluator {
    /// Resolve metric names, failing with every unknown name at once.
    pub fn new<S: AsRef<str>>(names: &[S]) -> GridResult<Self> {
        Ok(Self::from_metrics(Metric::parse_all(names)?))
    }

    pub fn from_metrics(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Produce `{prefix}_{metric}` for every metric, then
    /// `{prefix}_total_prediction_time` (mean wall-clock seconds of one
    /// scoring call) and `{prefix}_total_prediction_records` (row count).
    ///
    /// With no metrics configured the prediction time is `0.0`.
    pub fn evaluate(&self, model: &dyn Estimator, data: &Dataset, prefix: &str) -> GridResult<ResultRecord> {
        let mut record = ResultRecord::new();
        let mut total_seconds = 0.0;

        for metric in &self.metrics {
            let start = Instant::now();
            let value = sw_metrics::score(*metric, model, data)?;
            total_seconds += start.elapsed().as_secs_f64();
            record.insert(format!("{prefix}_{metric}"), value);
        }

        let mean_seconds = if self.metrics.is_empty() {
            0.0
        } else {
            total_seconds / self.metrics.len() as f64
        };
        record.insert(format!("{prefix}_total_prediction_time"), mean_seconds);
        record.insert(format!("{prefix}_total_prediction_records"), data.n_rows());
        Ok(record)
    }
}
