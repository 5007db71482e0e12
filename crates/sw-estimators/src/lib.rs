//! # sw-estimators
//!
//! Baseline estimators that plug into the grid search through the
//! [`Estimator`](sw_types::Estimator) trait, plus the registry the command
//! line tool resolves estimator files against.

mod dummy;
mod knn;
mod params;

pub use dummy::{DummyEstimator, DummyStrategy};
pub use knn::{KNeighbors, KnnTask, KnnWeights};

use sw_types::EstimatorRegistry;

/// Registry with every estimator in this crate.
pub fn default_registry() -> EstimatorRegistry {
    let mut registry = EstimatorRegistry::new();
    registry
        .register(DummyEstimator::KIND, DummyEstimator::build)
        .register(KNeighbors::KIND, KNeighbors::build);
    registry
}
