//! Great-circle cost provider.
//!
//! Computes straight-line distance locally and derives travel time from an
//! assumed speed. Ignores roads, but needs no network and never fails.

use crate::error::ProviderError;
use crate::matrix::CostMatrix;
use crate::traits::{Cost, CostProvider};
use crate::waypoint::Point;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone)]
pub struct HaversineProvider {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineProvider {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Great-circle distance between two (lat, lng) points in metres.
    pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        // Rounding can push `a` a hair past 1 for antipodal points.
        let c = 2.0 * a.min(1.0).sqrt().asin();

        EARTH_RADIUS_M * c
    }

    fn metres_to_seconds(&self, metres: f64) -> f64 {
        metres / (self.speed_kmh / 3.6)
    }

    fn cost(&self, from: &Point, to: &Point) -> Cost {
        let metres = Self::haversine_m(from.coords(), to.coords());
        Cost::with_duration(metres, self.metres_to_seconds(metres))
    }
}

impl CostProvider for HaversineProvider {
    fn pairwise(&self, from: &Point, to: &Point) -> Result<Cost, ProviderError> {
        Ok(self.cost(from, to))
    }

    fn matrix(&self, points: &[Point]) -> Result<CostMatrix, ProviderError> {
        let mut distances = Vec::with_capacity(points.len());
        let mut durations = Vec::with_capacity(points.len());

        for from in points {
            let (distance_row, duration_row): (Vec<f64>, Vec<f64>) = points
                .iter()
                .map(|to| {
                    let cost = self.cost(from, to);
                    (cost.distance, cost.duration.unwrap_or_default())
                })
                .unzip();
            distances.push(distance_row);
            durations.push(duration_row);
        }

        CostMatrix::with_durations(distances, durations)
    }

    fn cache_key(&self) -> String {
        format!("haversine:{}", self.speed_kmh)
    }
}
