//! Ordering strategies.
//!
//! Every strategy answers the same question: given a cost matrix and a
//! fixed start index, in which order should the stops be visited? Routes
//! are open paths; there is no return leg to the start.

mod cp;
mod exact;
mod greedy;
mod proximity;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use cp::{
    ConstraintProgrammingSolver, CpOutcome, DEFAULT_COST_SCALE, DEFAULT_TIME_BUDGET, MAX_COST_SCALE,
};
pub use exact::{DEFAULT_MAX_EXACT_STOPS, ExactPermutation};
pub use greedy::GreedyNearestNeighbor;
pub use proximity::ProximitySort;

use crate::error::SolveError;
use crate::matrix::CostMatrix;
use crate::traits::RouteSolver;

/// A visiting order: every stop index exactly once, starting at the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    order: Vec<usize>,
}

impl Route {
    pub(crate) fn new(order: Vec<usize>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn start(&self) -> Option<usize> {
        self.order.first().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether this route visits each of `size` indices exactly once.
    pub fn is_permutation_of(&self, size: usize) -> bool {
        let mut seen = vec![false; size];
        self.order.len() == size
            && self
                .order
                .iter()
                .all(|&index| index < size && !std::mem::replace(&mut seen[index], true))
    }
}

/// Which ordering strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Nearest unvisited stop first. Scales to any size.
    #[default]
    Greedy,
    /// Optimal order by exhaustive search; small problems only.
    Exact,
    /// Cheapest-arc construction plus time-bounded local search.
    Cp,
    /// Stops sorted by cost from the start.
    Proximity,
}

/// A configured strategy, dispatched through [`RouteSolver`].
#[derive(Debug, Clone)]
pub enum Solver {
    Greedy(GreedyNearestNeighbor),
    Exact(ExactPermutation),
    Cp(ConstraintProgrammingSolver),
    Proximity(ProximitySort),
}

impl Solver {
    pub fn new(strategy: Strategy, max_exact_n: usize, time_budget: Duration, cost_scale: f64) -> Self {
        match strategy {
            Strategy::Greedy => Self::Greedy(GreedyNearestNeighbor),
            Strategy::Exact => Self::Exact(ExactPermutation::new(max_exact_n)),
            Strategy::Cp => Self::Cp(ConstraintProgrammingSolver::new(time_budget, cost_scale)),
            Strategy::Proximity => Self::Proximity(ProximitySort),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Greedy(_) => Strategy::Greedy,
            Self::Exact(_) => Strategy::Exact,
            Self::Cp(_) => Strategy::Cp,
            Self::Proximity(_) => Strategy::Proximity,
        }
    }
}

impl RouteSolver for Solver {
    fn solve(&self, matrix: &CostMatrix, start: usize) -> Result<Route, SolveError> {
        match self {
            Self::Greedy(solver) => solver.solve(matrix, start),
            Self::Exact(solver) => solver.solve(matrix, start),
            Self::Cp(solver) => solver.solve(matrix, start),
            Self::Proximity(solver) => solver.solve(matrix, start),
        }
    }
}

fn check_start(matrix: &CostMatrix, start: usize) -> Result<(), SolveError> {
    if start < matrix.size() {
        Ok(())
    } else {
        Err(SolveError::StartOutOfRange {
            start,
            size: matrix.size(),
        })
    }
}

/// Indices other than `start`, ascending.
fn others(size: usize, start: usize) -> Vec<usize> {
    (0..size).filter(|&index| index != start).collect()
}
