//! Planning pipeline: waypoints → cost matrix → route → itinerary.
//!
//! The start is always planning index 0: the external start when the
//! waypoint set has one, otherwise the first uploaded stop. Leg and total
//! costs are read from the same matrix the solver ordered against; nothing
//! is recomputed with another metric.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::MatrixCache;
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::matrix::{CostMatrix, CostMatrixBuilder};
use crate::solver::{Route, Strategy};
use crate::traits::{CostProvider, RouteSolver};
use crate::waypoint::{Point, WaypointSet};

/// Planning index of the start.
pub const START_INDEX: usize = 0;

/// One stop of an itinerary, in visiting order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    /// Index into the planning points (start included).
    pub planning_index: usize,
    /// Row of the uploaded data, `None` for an external start.
    pub upload_position: Option<usize>,
    pub point: Point,
    /// Distance travelled from the start up to this stop.
    pub cumulative_distance: f64,
}

/// Travel between two consecutive stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub from: usize,
    pub to: usize,
    pub distance: f64,
    pub duration: Option<f64>,
}

/// A route annotated with per-leg and total cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub strategy: Strategy,
    pub route: Route,
    pub stops: Vec<Stop>,
    pub legs: Vec<Leg>,
    /// Metres.
    pub total_distance: f64,
    /// Seconds; `None` when the provider reported no durations.
    pub total_duration: Option<f64>,
}

impl Itinerary {
    fn new(strategy: Strategy, waypoints: &WaypointSet, matrix: &CostMatrix, route: Route) -> Self {
        let points = waypoints.planning_points();

        let legs: Vec<Leg> = route
            .order()
            .windows(2)
            .map(|pair| Leg {
                from: pair[0],
                to: pair[1],
                distance: matrix.distance(pair[0], pair[1]),
                duration: matrix.duration(pair[0], pair[1]),
            })
            .collect();

        let mut cumulative = 0.0;
        let stops = route
            .order()
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                if position > 0 {
                    cumulative += legs[position - 1].distance;
                }
                Stop {
                    planning_index: index,
                    upload_position: waypoints.upload_position(index),
                    point: points[index].clone(),
                    cumulative_distance: cumulative,
                }
            })
            .collect();

        let total_distance = legs.iter().fold(0.0, |total, leg| total + leg.distance);
        let total_duration = matrix
            .has_durations()
            .then(|| legs.iter().fold(0.0, |total, leg| total + leg.duration.unwrap_or_default()));

        Self {
            strategy,
            route,
            stops,
            legs,
            total_distance,
            total_duration,
        }
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance / 1000.0
    }

    /// Stop labels in visiting order.
    pub fn labels(&self) -> Vec<&str> {
        self.stops.iter().map(|stop| stop.point.label.as_str()).collect()
    }
}

/// Reusable planner with its configuration and an optional shared matrix cache.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    config: PlannerConfig,
    builder: CostMatrixBuilder,
    cache: Option<Arc<MatrixCache>>,
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            builder: config.matrix_builder(),
            config,
            cache: None,
        })
    }

    /// Memoizes cost matrices in `cache`, which may be shared between planners.
    pub fn with_cache(mut self, cache: Arc<MatrixCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a visiting order for `waypoints` using costs from `provider`.
    ///
    /// Either returns a complete itinerary or the first failure; partial
    /// itineraries are never produced.
    pub fn plan<P>(&self, waypoints: &WaypointSet, provider: &P) -> Result<Itinerary>
    where
        P: CostProvider + ?Sized,
    {
        let waypoints = self.config.start.resolve(waypoints)?;
        let points = waypoints.planning_points();

        let matrix = match &self.cache {
            Some(cache) => cache.get_or_build(&points, provider, &self.builder)?,
            None => Arc::new(self.builder.build(&points, provider)?),
        };
        debug!(
            stops = matrix.size(),
            external_start = waypoints.has_external_start(),
            "cost matrix ready"
        );

        let solver = self.config.solver();
        let route = solver.solve(&matrix, START_INDEX)?;
        debug_assert!(route.is_permutation_of(matrix.size()));

        let itinerary = Itinerary::new(solver.strategy(), &waypoints, &matrix, route);
        info!(
            strategy = ?itinerary.strategy,
            stops = itinerary.stops.len(),
            total_distance = itinerary.total_distance,
            "route planned"
        );
        Ok(itinerary)
    }
}

/// Plans without caching.
pub fn plan<P>(waypoints: &WaypointSet, provider: &P, config: &PlannerConfig) -> Result<Itinerary>
where
    P: CostProvider + ?Sized,
{
    RoutePlanner::new(config.clone())?.plan(waypoints, provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineProvider;

    #[test]
    fn cumulative_distance_accumulates_legs() {
        let waypoints = WaypointSet::new(vec![
            Point::new("A", 0.0, 0.0),
            Point::new("B", 0.0, 0.01),
            Point::new("C", 0.0, 0.02),
        ])
        .unwrap();

        let itinerary =
            plan(&waypoints, &HaversineProvider::default(), &PlannerConfig::default()).unwrap();

        assert_eq!(itinerary.labels(), vec!["A", "B", "C"]);
        assert_eq!(itinerary.stops[0].cumulative_distance, 0.0);
        assert_eq!(itinerary.stops[2].cumulative_distance, itinerary.total_distance);
        assert!(itinerary.total_duration.is_some());
        assert!((itinerary.total_distance_km() - 2.224).abs() < 0.01);
    }

    #[test]
    fn invalid_config_is_rejected_before_planning() {
        let config = PlannerConfig {
            max_concurrency: 0,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            RoutePlanner::new(config),
            Err(crate::error::PlanError::Config(_))
        ));
    }
}
