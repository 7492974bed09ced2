//! Single-vehicle routing search with a wall-clock budget.
//!
//! The problem is modelled with the start as depot and free return arcs,
//! which makes the tour an open path. Arc costs are quantized to integers
//! as `round(distance * cost_scale)` and every search decision compares
//! quantized costs only.
//!
//! Search runs in two phases:
//!
//! 1. Cheapest-arc construction: extend the path from its end along the
//!    cheapest arc to an unvisited stop.
//! 2. Local search: first-improvement 2-opt and or-opt (segments of one to
//!    three stops) until a local optimum or the deadline.
//!
//! If the deadline passes before construction completes there is no
//! solution. Once a complete path exists, the deadline only stops further
//! improvement.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SolveError;
use crate::matrix::CostMatrix;
use crate::traits::RouteSolver;

use super::{Route, check_start};

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(10);

/// Distance units per quantized cost unit; 1000 keeps millimetre precision for metres.
pub const DEFAULT_COST_SCALE: f64 = 1000.0;

/// Largest accepted quantization factor.
pub const MAX_COST_SCALE: f64 = 1e6;

/// Ceiling for a quantized path cost plus the arcs a move adds to it.
const MAX_QUANTIZED_TOTAL: f64 = (i64::MAX / 2) as f64;

const MAX_SEGMENT: usize = 3;

#[derive(Debug, Clone)]
pub struct ConstraintProgrammingSolver {
    pub time_budget: Duration,
    pub cost_scale: f64,
}

impl Default for ConstraintProgrammingSolver {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            cost_scale: DEFAULT_COST_SCALE,
        }
    }
}

/// A route together with the quantized objective the search minimized.
#[derive(Debug, Clone, PartialEq)]
pub struct CpOutcome {
    pub route: Route,
    /// Sum of quantized arc costs along the route.
    pub objective: i64,
    pub cost_scale: f64,
    pub improvements: usize,
}

impl CpOutcome {
    /// The objective converted back to distance units.
    ///
    /// Differs from the unquantized path cost by at most half a unit of
    /// `1 / cost_scale` per leg.
    pub fn dequantized_objective(&self) -> f64 {
        self.objective as f64 / self.cost_scale
    }
}

impl ConstraintProgrammingSolver {
    pub fn new(time_budget: Duration, cost_scale: f64) -> Self {
        Self {
            time_budget,
            cost_scale,
        }
    }

    /// Runs the search and reports the optimized objective alongside the route.
    pub fn solve_detailed(&self, matrix: &CostMatrix, start: usize) -> Result<CpOutcome, SolveError> {
        check_start(matrix, start)?;

        if matrix.size() == 1 {
            return Ok(CpOutcome {
                route: Route::new(vec![start]),
                objective: 0,
                cost_scale: self.cost_scale,
                improvements: 0,
            });
        }
        let arcs = QuantizedArcs::new(matrix, self.cost_scale)?;

        let deadline = Instant::now() + self.time_budget;
        let mut order = cheapest_arc_path(&arcs, start, deadline).ok_or(SolveError::NoSolution {
            budget: self.time_budget,
        })?;
        let initial = arcs.path_cost(&order);

        let mut improvements = 0;
        while Instant::now() < deadline {
            if two_opt(&arcs, &mut order, deadline) || or_opt(&arcs, &mut order, deadline) {
                improvements += 1;
            } else {
                break;
            }
        }

        let objective = arcs.path_cost(&order);
        debug!(
            stops = order.len(),
            initial,
            objective,
            improvements,
            "cp search finished"
        );

        Ok(CpOutcome {
            route: Route::new(order),
            objective,
            cost_scale: self.cost_scale,
            improvements,
        })
    }
}

impl RouteSolver for ConstraintProgrammingSolver {
    fn solve(&self, matrix: &CostMatrix, start: usize) -> Result<Route, SolveError> {
        self.solve_detailed(matrix, start).map(|outcome| outcome.route)
    }
}

/// Integral arc costs, row-major.
struct QuantizedArcs {
    size: usize,
    costs: Vec<i64>,
}

impl QuantizedArcs {
    /// Fails when a path of `size - 1` arcs, plus the two arcs a move may
    /// add before it is compared, could exceed the integer range.
    fn new(matrix: &CostMatrix, scale: f64) -> Result<Self, SolveError> {
        let size = matrix.size();
        let largest = (0..size)
            .flat_map(|from| (0..size).map(move |to| matrix.distance(from, to)))
            .fold(0.0, f64::max);

        let worst = (largest * scale).round() * (size + 1) as f64;
        if !(worst.is_finite() && worst <= MAX_QUANTIZED_TOTAL) {
            return Err(SolveError::CostOverflow {
                largest,
                cost_scale: scale,
            });
        }

        let mut costs = Vec::with_capacity(size * size);
        for from in 0..size {
            for to in 0..size {
                costs.push((matrix.distance(from, to) * scale).round() as i64);
            }
        }
        Ok(Self { size, costs })
    }

    fn arc(&self, from: usize, to: usize) -> i64 {
        self.costs[from * self.size + to]
    }

    fn path_cost(&self, order: &[usize]) -> i64 {
        order.windows(2).map(|leg| self.arc(leg[0], leg[1])).sum()
    }
}

fn cheapest_arc_path(arcs: &QuantizedArcs, start: usize, deadline: Instant) -> Option<Vec<usize>> {
    let n = arcs.size;
    let mut visited = vec![false; n];
    visited[start] = true;
    let mut order = Vec::with_capacity(n);
    order.push(start);

    while order.len() < n {
        if Instant::now() >= deadline {
            return None;
        }
        let end = order[order.len() - 1];
        let next = (0..n)
            .filter(|&candidate| !visited[candidate])
            .min_by_key(|&candidate| (arcs.arc(end, candidate), candidate))?;
        visited[next] = true;
        order.push(next);
    }

    Some(order)
}

/// Applies the first improving segment reversal found. Position 0 stays fixed.
///
/// Reversing a segment flips the direction of every arc inside it, so the
/// reversed inner cost comes from a backward prefix sum rather than being
/// assumed equal to the forward one.
fn two_opt(arcs: &QuantizedArcs, order: &mut [usize], deadline: Instant) -> bool {
    let n = order.len();
    if n < 3 {
        return false;
    }

    let mut forward = vec![0i64; n];
    let mut backward = vec![0i64; n];
    for k in 1..n {
        forward[k] = forward[k - 1] + arcs.arc(order[k - 1], order[k]);
        backward[k] = backward[k - 1] + arcs.arc(order[k], order[k - 1]);
    }

    for i in 1..n - 1 {
        if Instant::now() >= deadline {
            return false;
        }
        let prev = order[i - 1];
        for j in i + 1..n {
            let next = order.get(j + 1).copied();

            let before = arcs.arc(prev, order[i])
                + (forward[j] - forward[i])
                + next.map_or(0, |next| arcs.arc(order[j], next));
            let after = arcs.arc(prev, order[j])
                + (backward[j] - backward[i])
                + next.map_or(0, |next| arcs.arc(order[i], next));

            if after < before {
                order[i..=j].reverse();
                return true;
            }
        }
    }

    false
}

/// Applies the first improving move of a short segment to another position.
fn or_opt(arcs: &QuantizedArcs, order: &mut Vec<usize>, deadline: Instant) -> bool {
    let n = order.len();

    for len in 1..=MAX_SEGMENT.min(n.saturating_sub(2)) {
        for i in 1..=n - len {
            if Instant::now() >= deadline {
                return false;
            }

            let first = order[i];
            let last = order[i + len - 1];
            let prev = order[i - 1];
            let next = order.get(i + len).copied();

            let removal_gain = arcs.arc(prev, first)
                + next.map_or(0, |next| arcs.arc(last, next) - arcs.arc(prev, next));

            let rest: Vec<usize> = order[..i].iter().chain(&order[i + len..]).copied().collect();
            // Insert after rest[p - 1]; p == i puts the segment back where it was.
            for p in 1..=rest.len() {
                if p == i {
                    continue;
                }
                let after = rest[p - 1];
                let before = rest.get(p).copied();
                let insertion_cost = arcs.arc(after, first)
                    + before.map_or(0, |before| arcs.arc(last, before) - arcs.arc(after, before));

                if insertion_cost < removal_gain {
                    let segment: Vec<usize> = order[i..i + len].to_vec();
                    let mut moved = rest;
                    moved.splice(p..p, segment);
                    *order = moved;
                    return true;
                }
            }
        }
    }

    false
}
