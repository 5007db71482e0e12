use std::time::Instant;

use sw_types::{Dataset, Estimator, GridResult, ParameterSet, ResultRecord};

use crate::evaluator::Evaluator;

/// Fit `model` on `data` and score it on the same data.
///
/// The record holds the `training_*` metric fields and prediction timings
/// followed by `training_time_total`, the wall-clock seconds spent in `fit`.
/// The model is left fitted.
pub fn train(
    model: &mut dyn Estimator,
    data: &Dataset,
    fit_params: &ParameterSet,
    evaluator: &Evaluator,
) -> GridResult<ResultRecord> {
    let start = Instant::now();
    model.fit(data, fit_params)?;
    let fit_seconds = start.elapsed().as_secs_f64();

    let mut record = evaluator.evaluate(model, data, "training")?;
    record.insert("training_time_total", fit_seconds);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_estimators::{KNeighbors, KnnTask};
    use sw_types::Metric;

    #[test]
    fn test_training_record() {
        let data = Dataset::new(
            vec!["x".into()],
            vec![vec![0.0], vec![1.0], vec![5.0], vec![6.0]],
            vec![0.0, 0.0, 1.0, 1.0],
        )
        .unwrap();
        let mut model = KNeighbors::new(1, KnnTask::Classification);
        let evaluator = Evaluator::from_metrics(vec![Metric::Accuracy]);

        let record = train(&mut model, &data, &ParameterSet::new(), &evaluator).unwrap();

        assert_eq!(record.get_f64("training_accuracy"), Some(1.0));
        assert_eq!(record.get_f64("training_total_prediction_records"), Some(4.0));
        assert!(record.get_f64("training_time_total").unwrap() >= 0.0);
        assert_eq!(record.fields().last(), Some("training_time_total"));
        assert!(model.predict(&data).is_ok());
    }

    #[test]
    fn test_fit_errors_propagate() {
        let data = Dataset::new(vec!["x".into()], vec![vec![0.0]], vec![0.0]).unwrap();
        let mut model = KNeighbors::new(3, KnnTask::Classification);
        let evaluator = Evaluator::from_metrics(vec![Metric::Accuracy]);
        assert!(train(&mut model, &data, &ParameterSet::new(), &evaluator).is_err());
    }
}
