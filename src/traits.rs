//! Core seams of the route planner.
//!
//! Cost backends and ordering strategies plug in here; everything else in
//! the crate is written against these traits.

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, SolveError};
use crate::matrix::CostMatrix;
use crate::solver::Route;
use crate::waypoint::Point;

/// Travel cost between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    /// Distance in metres. Never negative.
    pub distance: f64,
    /// Travel time in seconds, when the backend reports one.
    pub duration: Option<f64>,
}

impl Cost {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            duration: None,
        }
    }

    pub fn with_duration(distance: f64, duration: f64) -> Self {
        Self {
            distance,
            duration: Some(duration),
        }
    }
}

/// Provides travel costs between points.
///
/// Costs are directional: `pairwise(a, b)` need not equal `pairwise(b, a)`.
pub trait CostProvider: Sync {
    /// Cost of travelling from `from` to `to`.
    fn pairwise(&self, from: &Point, to: &Point) -> Result<Cost, ProviderError>;

    /// Full matrix for `points`, indexed by their order.
    ///
    /// Backends that can answer in one batched request should override this.
    fn matrix(&self, _points: &[Point]) -> Result<CostMatrix, ProviderError> {
        Err(ProviderError::Unsupported)
    }

    /// Identity of this provider's configuration, used to key cached matrices.
    ///
    /// Two providers with the same key must return the same costs.
    fn cache_key(&self) -> String;
}

/// Produces a visiting order from a cost matrix and a fixed start index.
pub trait RouteSolver {
    fn solve(&self, matrix: &CostMatrix, start: usize) -> Result<Route, SolveError>;
}
