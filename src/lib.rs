//! route-planner core
//!
//! Orders a set of geographic stops into a visiting sequence that keeps
//! total travel cost low, then reports per-leg and total costs.

pub mod cache;
pub mod config;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod osrm;
pub mod planner;
pub mod solver;
pub mod traits;
pub mod waypoint;

pub use error::{PlanError, Result};
pub use planner::{Itinerary, RoutePlanner, plan};
