//! Pairwise cost matrix and its construction from a [`CostProvider`].

use std::sync::{Arc, OnceLock};

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{MatrixBuildError, ProviderError};
use crate::traits::{Cost, CostProvider};
use crate::waypoint::Point;

/// Default bound on concurrent pairwise provider calls.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// A dense n×n matrix of directional travel costs, stored row-major.
///
/// Diagonal entries are zero and every entry is finite and non-negative.
/// The matrix is not assumed to be symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    distances: Vec<f64>,
    durations: Option<Vec<f64>>,
}

impl CostMatrix {
    /// Builds a matrix from explicit distance rows.
    ///
    /// Diagonal entries are forced to zero. Fails if the rows are not square
    /// or an off-diagonal entry is negative or not finite.
    pub fn from_rows(distances: Vec<Vec<f64>>) -> Result<Self, ProviderError> {
        let size = distances.len();
        Ok(Self {
            size,
            distances: flatten(distances, size)?,
            durations: None,
        })
    }

    /// Builds a matrix with both distance and duration rows.
    pub fn with_durations(
        distances: Vec<Vec<f64>>,
        durations: Vec<Vec<f64>>,
    ) -> Result<Self, ProviderError> {
        let size = distances.len();
        if durations.len() != size {
            return Err(ProviderError::invalid_response(format!(
                "duration matrix has {} rows, expected {size}",
                durations.len()
            )));
        }
        Ok(Self {
            size,
            distances: flatten(distances, size)?,
            durations: Some(flatten(durations, size)?),
        })
    }

    /// A single-stop matrix.
    pub fn trivial() -> Self {
        Self {
            size: 1,
            distances: vec![0.0],
            durations: None,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from * self.size + to]
    }

    pub fn duration(&self, from: usize, to: usize) -> Option<f64> {
        self.durations
            .as_ref()
            .map(|durations| durations[from * self.size + to])
    }

    pub fn has_durations(&self) -> bool {
        self.durations.is_some()
    }

    /// Sum of consecutive leg distances along `order`, in order.
    pub fn path_distance(&self, order: &[usize]) -> f64 {
        order
            .windows(2)
            .fold(0.0, |total, leg| total + self.distance(leg[0], leg[1]))
    }

    fn from_costs(size: usize, entries: Vec<(usize, usize, Cost)>) -> Result<Self, ProviderError> {
        let mut distances = vec![0.0; size * size];
        let mut durations = Some(vec![0.0; size * size]);

        for (from, to, cost) in entries {
            check_entry(from, to, cost.distance)?;
            distances[from * size + to] = cost.distance;

            match (cost.duration, durations.as_mut()) {
                (Some(duration), Some(row_major)) => {
                    check_entry(from, to, duration)?;
                    row_major[from * size + to] = duration;
                }
                (None, Some(_)) => durations = None,
                _ => {}
            }
        }

        Ok(Self {
            size,
            distances,
            durations,
        })
    }
}

fn flatten(rows: Vec<Vec<f64>>, size: usize) -> Result<Vec<f64>, ProviderError> {
    let mut flat = Vec::with_capacity(size * size);
    for (from, row) in rows.into_iter().enumerate() {
        if row.len() != size {
            return Err(ProviderError::invalid_response(format!(
                "row {from} has {} entries, expected {size}",
                row.len()
            )));
        }
        for (to, value) in row.into_iter().enumerate() {
            if from == to {
                flat.push(0.0);
            } else {
                check_entry(from, to, value)?;
                flat.push(value);
            }
        }
    }
    Ok(flat)
}

fn check_entry(from: usize, to: usize, value: f64) -> Result<(), ProviderError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProviderError::InvalidCost { from, to, value })
    }
}

/// Builds complete cost matrices, preferring the provider's bulk query.
///
/// The worker pool for pairwise queries is started on first use and shared
/// by clones of the builder.
#[derive(Debug, Clone)]
pub struct CostMatrixBuilder {
    max_concurrency: usize,
    pool: Arc<OnceLock<Option<ThreadPool>>>,
}

impl Default for CostMatrixBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl CostMatrixBuilder {
    /// `max_concurrency` bounds in-flight pairwise calls; zero is treated as one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            pool: Arc::default(),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    fn pool(&self) -> Option<&ThreadPool> {
        self.pool
            .get_or_init(|| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.max_concurrency)
                    .thread_name(|i| format!("cost-matrix-{i}"))
                    .build()
                    .inspect_err(|err| {
                        warn!(error = %err, "could not start provider pool; querying sequentially")
                    })
                    .ok()
            })
            .as_ref()
    }

    /// Builds the full matrix for `points`, or fails without a partial result.
    pub fn build<P>(&self, points: &[Point], provider: &P) -> Result<CostMatrix, MatrixBuildError>
    where
        P: CostProvider + ?Sized,
    {
        let n = points.len();
        if n == 1 {
            return Ok(CostMatrix::trivial());
        }

        match provider.matrix(points) {
            Ok(matrix) if matrix.size() == n => {
                debug!(stops = n, "using bulk cost matrix");
                return Ok(matrix);
            }
            Ok(matrix) => {
                warn!(
                    expected = n,
                    got = matrix.size(),
                    "bulk matrix has wrong dimensions; falling back to pairwise"
                );
            }
            Err(ProviderError::Unsupported) => {
                debug!(stops = n, "bulk matrix unsupported; querying pairwise");
            }
            Err(err) => {
                warn!(error = %err, "bulk matrix failed; falling back to pairwise");
            }
        }

        self.build_pairwise(points, provider)
            .map_err(|source| MatrixBuildError { stops: n, source })
    }

    fn build_pairwise<P>(&self, points: &[Point], provider: &P) -> Result<CostMatrix, ProviderError>
    where
        P: CostProvider + ?Sized,
    {
        let n = points.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|from| (0..n).filter(move |&to| to != from).map(move |to| (from, to)))
            .collect();

        let query = |&(from, to): &(usize, usize)| {
            provider
                .pairwise(&points[from], &points[to])
                .map(|cost| (from, to, cost))
        };

        let entries = match self.pool() {
            Some(pool) => pool.install(|| pairs.par_iter().map(query).collect::<Result<Vec<_>, _>>())?,
            None => pairs.iter().map(query).collect::<Result<Vec<_>, _>>()?,
        };

        debug!(stops = n, calls = entries.len(), "pairwise cost matrix complete");
        CostMatrix::from_costs(n, entries)
    }
}
