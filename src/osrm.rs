//! OSRM HTTP adapter for road-network costs.
//!
//! Bulk matrices come from the `table` service, single pairs from `route`.
//! Transient failures (timeouts, refused connections, 429, 5xx) are retried
//! with linear backoff before being reported.

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::matrix::CostMatrix;
use crate::traits::{Cost, CostProvider};
use crate::waypoint::Point;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
    /// Sent as the `Authorization` header for hosted services that need one.
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
            api_key: None,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    fn table_url(&self, points: &[Point]) -> String {
        format!(
            "{}/table/v1/{}/{}?annotations=distance,duration",
            self.config.base_url,
            self.config.profile,
            coordinates(points)
        )
    }

    fn route_url(&self, from: &Point, to: &Point) -> String {
        format!(
            "{}/route/v1/{}/{}?overview=false",
            self.config.base_url,
            self.config.profile,
            coordinates(&[from.clone(), to.clone()])
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.try_get_json(url) {
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(self.config.retry_backoff_ms * u64::from(attempt));
                    warn!(error = %err, attempt, ?backoff, "OSRM request failed; retrying");
                    thread::sleep(backoff);
                }
                result => return result,
            }
        }
    }

    fn try_get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.config.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>()?)
    }
}

impl CostProvider for OsrmClient {
    fn pairwise(&self, from: &Point, to: &Point) -> Result<Cost, ProviderError> {
        let body: OsrmRouteResponse = self.get_json(&self.route_url(from, to))?;
        parse_route(body)
    }

    fn matrix(&self, points: &[Point]) -> Result<CostMatrix, ProviderError> {
        if points.is_empty() {
            return CostMatrix::from_rows(Vec::new());
        }

        debug!(stops = points.len(), "requesting OSRM table");
        let body: OsrmTableResponse = self.get_json(&self.table_url(points))?;
        parse_table(body, points.len())
    }

    fn cache_key(&self) -> String {
        format!("osrm:{}/{}", self.config.base_url, self.config.profile)
    }
}

/// OSRM takes `lng,lat` pairs separated by `;`.
fn coordinates(points: &[Point]) -> String {
    points
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.longitude, point.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
}

fn check_code(code: &str, message: Option<String>) -> Result<(), ProviderError> {
    if code == "Ok" {
        Ok(())
    } else {
        Err(ProviderError::Rejected(match message {
            Some(message) => format!("{code}: {message}"),
            None => code.to_string(),
        }))
    }
}

fn parse_route(body: OsrmRouteResponse) -> Result<Cost, ProviderError> {
    check_code(&body.code, body.message)?;
    body.routes
        .first()
        .map(|route| Cost::with_duration(route.distance, route.duration))
        .ok_or_else(|| ProviderError::invalid_response("route response has no routes"))
}

fn parse_table(body: OsrmTableResponse, size: usize) -> Result<CostMatrix, ProviderError> {
    check_code(&body.code, body.message)?;

    let distances = body
        .distances
        .ok_or_else(|| ProviderError::invalid_response("table response has no distances"))
        .and_then(|rows| reachable(rows, size))?;

    match body.durations {
        Some(rows) => CostMatrix::with_durations(distances, reachable(rows, size)?),
        None => CostMatrix::from_rows(distances),
    }
}

/// Unreachable pairs come back as `null`; a matrix with holes is unusable.
fn reachable(rows: Vec<Vec<Option<f64>>>, size: usize) -> Result<Vec<Vec<f64>>, ProviderError> {
    if rows.len() != size {
        return Err(ProviderError::invalid_response(format!(
            "table has {} rows, expected {size}",
            rows.len()
        )));
    }

    rows.into_iter()
        .enumerate()
        .map(|(from, row)| {
            row.into_iter()
                .enumerate()
                .map(|(to, value)| {
                    value.ok_or_else(|| {
                        ProviderError::invalid_response(format!("no route from {from} to {to}"))
                    })
                })
                .collect()
        })
        .collect()
}
