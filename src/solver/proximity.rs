//! Orders stops by their cost from the start, nearest first.

use crate::error::SolveError;
use crate::matrix::CostMatrix;
use crate::traits::RouteSolver;

use super::{Route, check_start, others};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProximitySort;

impl RouteSolver for ProximitySort {
    fn solve(&self, matrix: &CostMatrix, start: usize) -> Result<Route, SolveError> {
        check_start(matrix, start)?;

        let mut rest = others(matrix.size(), start);
        // Stable sort keeps ascending index order on ties.
        rest.sort_by(|&a, &b| matrix.distance(start, a).total_cmp(&matrix.distance(start, b)));

        let mut order = Vec::with_capacity(matrix.size());
        order.push(start);
        order.extend(rest);
        Ok(Route::new(order))
    }
}
