//! Planner configuration.
//!
//! Loaded from TOML so strategy and limits can change without code changes:
//!
//! ```
//! use route_planner::config::PlannerConfig;
//! use route_planner::solver::Strategy;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     strategy = "cp"
//!     time_budget_seconds = 5
//!
//!     [start]
//!     kind = "explicit"
//!     latitude = 36.1147
//!     longitude = -115.1728
//! "#).unwrap();
//!
//! assert_eq!(config.strategy, Strategy::Cp);
//! assert_eq!(config.time_budget().as_secs(), 5);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matrix::{CostMatrixBuilder, DEFAULT_MAX_CONCURRENCY};
use crate::solver::{
    DEFAULT_COST_SCALE, DEFAULT_MAX_EXACT_STOPS, DEFAULT_TIME_BUDGET, MAX_COST_SCALE, Solver, Strategy,
};
use crate::waypoint::{Point, StartLocation};

/// Longest accepted CP time budget.
const MAX_TIME_BUDGET_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PlannerConfig {
    pub strategy: Strategy,
    pub start: StartLocation,
    /// Wall-clock budget for the `cp` strategy.
    pub time_budget_seconds: u64,
    /// Largest problem the `exact` strategy accepts, start included.
    pub max_exact_n: usize,
    /// Quantization factor for `cp` arc costs, at most [`MAX_COST_SCALE`].
    pub cost_scale: f64,
    /// Bound on concurrent pairwise provider calls.
    pub max_concurrency: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            start: StartLocation::default(),
            time_budget_seconds: DEFAULT_TIME_BUDGET.as_secs(),
            max_exact_n: DEFAULT_MAX_EXACT_STOPS,
            cost_scale: DEFAULT_COST_SCALE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl PlannerConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        if self.max_exact_n == 0 {
            return Err(ConfigError::Invalid("max_exact_n must be at least 1".into()));
        }
        if !(self.cost_scale > 0.0 && self.cost_scale <= MAX_COST_SCALE) {
            return Err(ConfigError::Invalid(format!(
                "cost_scale must be in (0, {MAX_COST_SCALE}], got {}",
                self.cost_scale
            )));
        }
        if self.time_budget_seconds > MAX_TIME_BUDGET_SECS {
            return Err(ConfigError::Invalid(format!(
                "time_budget_seconds must not exceed {MAX_TIME_BUDGET_SECS}"
            )));
        }
        if let StartLocation::Explicit {
            latitude,
            longitude,
            label,
        } = &self.start
        {
            if !Point::new(label.clone(), *latitude, *longitude).is_valid() {
                return Err(ConfigError::Invalid(format!(
                    "start location ({latitude}, {longitude}) is not a valid coordinate"
                )));
            }
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_seconds)
    }

    pub fn solver(&self) -> Solver {
        Solver::new(
            self.strategy,
            self.max_exact_n,
            self.time_budget(),
            self.cost_scale,
        )
    }

    pub fn matrix_builder(&self) -> CostMatrixBuilder {
        CostMatrixBuilder::new(self.max_concurrency)
    }
}
