//! Exhaustive search over visiting orders.
//!
//! Orders are enumerated depth-first in ascending index order, so the
//! first optimum found is the lexicographically smallest one. Branches
//! whose partial cost already reaches the best complete cost are cut; with
//! non-negative costs they cannot produce a strictly better route.

use crate::error::SolveError;
use crate::matrix::CostMatrix;
use crate::traits::RouteSolver;

use super::{Route, check_start, others};

/// Largest problem (start included) searched by default.
pub const DEFAULT_MAX_EXACT_STOPS: usize = 10;

#[derive(Debug, Clone)]
pub struct ExactPermutation {
    /// Refuse problems with more stops than this, start included.
    pub max_stops: usize,
}

impl Default for ExactPermutation {
    fn default() -> Self {
        Self {
            max_stops: DEFAULT_MAX_EXACT_STOPS,
        }
    }
}

impl ExactPermutation {
    pub fn new(max_stops: usize) -> Self {
        Self { max_stops }
    }
}

impl RouteSolver for ExactPermutation {
    fn solve(&self, matrix: &CostMatrix, start: usize) -> Result<Route, SolveError> {
        check_start(matrix, start)?;

        let n = matrix.size();
        // A lone start has only one order, whatever the limit.
        if n > self.max_stops.max(1) {
            return Err(SolveError::ProblemTooLarge {
                stops: n,
                max: self.max_stops,
            });
        }

        let mut search = Search {
            matrix,
            candidates: others(n, start),
            used: vec![false; n.saturating_sub(1)],
            path: Vec::with_capacity(n),
            best: None,
        };
        search.path.push(start);
        search.extend(0.0);

        let order = match search.best {
            Some((_, order)) => order,
            None => vec![start],
        };
        Ok(Route::new(order))
    }
}

struct Search<'a> {
    matrix: &'a CostMatrix,
    candidates: Vec<usize>,
    used: Vec<bool>,
    path: Vec<usize>,
    best: Option<(f64, Vec<usize>)>,
}

impl Search<'_> {
    fn extend(&mut self, cost: f64) {
        if self.path.len() == self.candidates.len() + 1 {
            if self.best.as_ref().is_none_or(|(best, _)| cost < *best) {
                self.best = Some((cost, self.path.clone()));
            }
            return;
        }

        let last = self.path[self.path.len() - 1];
        for k in 0..self.candidates.len() {
            if self.used[k] {
                continue;
            }
            let next = self.candidates[k];
            let extended = cost + self.matrix.distance(last, next);
            if self.best.as_ref().is_some_and(|(best, _)| extended >= *best) {
                continue;
            }

            self.used[k] = true;
            self.path.push(next);
            self.extend(extended);
            self.path.pop();
            self.used[k] = false;
        }
    }
}
