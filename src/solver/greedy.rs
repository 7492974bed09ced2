//! Nearest-neighbor construction.
//!
//! From the start, always move to the cheapest unvisited stop. O(n²), no
//! optimality guarantee. Ties go to the lowest index so results are
//! reproducible.

use crate::error::SolveError;
use crate::matrix::CostMatrix;
use crate::traits::RouteSolver;

use super::{Route, check_start};

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyNearestNeighbor;

impl RouteSolver for GreedyNearestNeighbor {
    fn solve(&self, matrix: &CostMatrix, start: usize) -> Result<Route, SolveError> {
        check_start(matrix, start)?;

        let n = matrix.size();
        let mut visited = vec![false; n];
        visited[start] = true;

        let mut order = Vec::with_capacity(n);
        order.push(start);
        let mut current = start;

        while order.len() < n {
            let mut best: Option<(usize, f64)> = None;
            for candidate in 0..n {
                if visited[candidate] {
                    continue;
                }
                let cost = matrix.distance(current, candidate);
                // Strict comparison keeps the lowest index on ties.
                if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                    best = Some((candidate, cost));
                }
            }

            let Some((next, _)) = best else { break };
            visited[next] = true;
            order.push(next);
            current = next;
        }

        Ok(Route::new(order))
    }
}
