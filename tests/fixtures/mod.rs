//! Shared test fixtures: real site coordinates and scripted cost providers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use route_planner::error::ProviderError;
use route_planner::matrix::CostMatrix;
use route_planner::traits::{Cost, CostProvider};
use route_planner::waypoint::{Point, WaypointSet};

// ============================================================================
// Sites
// ============================================================================

/// Site visits spread across the Las Vegas valley (OpenStreetMap coordinates).
pub fn las_vegas_sites() -> Vec<Point> {
    vec![
        Point::new("Wynn Las Vegas", 36.1263781, -115.1658180),
        Point::new("Beers and Bets", 36.1428945, -115.1573836),
        Point::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
        Point::new("Bellagio", 36.1126, -115.1767),
        Point::new("MGM Grand", 36.1023654, -115.1688720),
        Point::new("Bootlegger Bistro", 36.0492047, -115.1715744),
        Point::new("Budget Suites South", 36.0366259, -115.1713361),
        Point::new("Green Valley Ranch Area", 36.0308, -115.0825),
        Point::new("Sunset Station Area", 36.0614, -115.0631),
        Point::new("Longhorn Casino", 36.1070664, -115.0591256),
        Point::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
        Point::new("Islander's Grill", 36.0335058, -114.9856162),
    ]
}

pub fn sites(count: usize) -> WaypointSet {
    WaypointSet::new(las_vegas_sites().into_iter().take(count).collect()).unwrap()
}

/// One point per label, point `i` at latitude `i * 0.01`.
pub fn labelled(labels: &[&str]) -> WaypointSet {
    WaypointSet::new(
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| Point::new(*label, i as f64 * 0.01, 0.0))
            .collect(),
    )
    .unwrap()
}

// ============================================================================
// Providers
// ============================================================================

/// Answers from a fixed matrix, addressing points by their latitude-encoded index.
pub struct MatrixProvider {
    rows: Vec<Vec<f64>>,
    bulk: bool,
    pub pairwise_calls: AtomicUsize,
    pub bulk_calls: AtomicUsize,
}

impl MatrixProvider {
    pub fn bulk(rows: Vec<Vec<f64>>) -> Self {
        Self {
            rows,
            bulk: true,
            pairwise_calls: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
        }
    }

    pub fn pairwise_only(rows: Vec<Vec<f64>>) -> Self {
        Self {
            bulk: false,
            ..Self::bulk(rows)
        }
    }

    fn index(point: &Point) -> usize {
        (point.latitude * 100.0).round() as usize
    }
}

impl CostProvider for MatrixProvider {
    fn pairwise(&self, from: &Point, to: &Point) -> Result<Cost, ProviderError> {
        self.pairwise_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Cost::new(self.rows[Self::index(from)][Self::index(to)]))
    }

    fn matrix(&self, points: &[Point]) -> Result<CostMatrix, ProviderError> {
        if !self.bulk {
            return Err(ProviderError::Unsupported);
        }
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let rows = points
            .iter()
            .map(|from| {
                points
                    .iter()
                    .map(|to| self.rows[Self::index(from)][Self::index(to)])
                    .collect()
            })
            .collect();
        CostMatrix::from_rows(rows)
    }

    fn cache_key(&self) -> String {
        format!("fixed:{:?}", self.rows)
    }
}

/// Pairwise-only provider that fails on its `fail_on`-th call (1-based).
pub struct FailingProvider {
    pub fail_on: usize,
    pub calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl CostProvider for FailingProvider {
    fn pairwise(&self, _: &Point, _: &Point) -> Result<Cost, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            Err(ProviderError::Status {
                status: 429,
                body: "daily quota exceeded".into(),
            })
        } else {
            Ok(Cost::new(1.0))
        }
    }

    fn cache_key(&self) -> String {
        "failing".into()
    }
}

// ============================================================================
// Matrices
// ============================================================================

/// A, B, C with d(A,B) = d(B,C) = 1 and d(A,C) = 1.5, symmetric.
pub fn triangle() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 1.0, 1.5],
        vec![1.0, 0.0, 1.0],
        vec![1.5, 1.0, 0.0],
    ]
}

/// The triangle with cheap arcs back out of C: d(C,A) = 0.1 and d(C,B) = 0.1.
///
/// Reading the matrix transposed would make A -> C look like 0.1.
pub fn asymmetric_triangle() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 1.0, 1.5],
        vec![1.0, 0.0, 1.0],
        vec![0.1, 0.1, 0.0],
    ]
}
