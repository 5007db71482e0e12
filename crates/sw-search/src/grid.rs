//! Grid enumeration.

use serde::{Deserialize, Serialize};
use sw_types::{ModelId, ParamGrid, ParameterSet};

/// One combination of hyperparameters, identified by its position in the
/// enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub model_id: ModelId,
    pub params: ParameterSet,
}

/// Exhaustive grid search: every combination of the axis values.
///
/// Points are produced in row-major order over the axes as declared, so the
/// first axis varies slowest and the last varies fastest. Model ids are the
/// zero-based positions in that order and are stable for a given grid, which
/// is what lets an interrupted run find its completed points again.
#[derive(Debug, Clone)]
pub struct GridSearch {
    points: Vec<GridPoint>,
}

impl GridSearch {
    pub fn new(grid: &ParamGrid) -> Self {
        let points = Self::build_grid(grid)
            .into_iter()
            .enumerate()
            .map(|(model_id, params)| GridPoint { model_id, params })
            .collect();
        Self { points }
    }

    fn build_grid(grid: &ParamGrid) -> Vec<ParameterSet> {
        // Cartesian product
        let mut result: Vec<ParameterSet> = vec![ParameterSet::new()];
        for axis in &grid.axes {
            let mut next = Vec::with_capacity(result.len() * axis.values.len());
            for existing in &result {
                for value in &axis.values {
                    let mut combo = existing.clone();
                    combo.insert(axis.name.clone(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }
        result
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GridPoint> {
        self.points
    }
}
