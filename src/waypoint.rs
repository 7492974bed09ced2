//! Points to visit and the set they are planned as.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A single geographic stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            label: label.into(),
            latitude,
            longitude,
        }
    }

    /// (lat, lng) pair, the order backends take coordinates in.
    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    fn validate(&self, index: Option<usize>) -> Result<(), ValidationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError::InvalidCoordinate {
                index,
                label: self.label.clone(),
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Uploaded stops in upload order, plus an optional external start.
///
/// When a start is set it occupies index 0 of the planning problem and the
/// uploaded stops follow at 1..=n. Without one, the first uploaded stop is
/// the start.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSet {
    stops: Vec<Point>,
    start: Option<Point>,
}

impl WaypointSet {
    /// Validates and wraps the uploaded stops. Duplicate labels are allowed.
    pub fn new(stops: Vec<Point>) -> Result<Self, ValidationError> {
        if stops.is_empty() {
            return Err(ValidationError::Empty);
        }
        for (index, point) in stops.iter().enumerate() {
            point.validate(Some(index))?;
        }
        Ok(Self { stops, start: None })
    }

    /// Sets an external start location that is not one of the uploaded stops.
    pub fn with_start(mut self, start: Point) -> Result<Self, ValidationError> {
        start.validate(None)?;
        self.start = Some(start);
        Ok(self)
    }

    pub fn stops(&self) -> &[Point] {
        &self.stops
    }

    pub fn start(&self) -> Option<&Point> {
        self.start.as_ref()
    }

    pub fn has_external_start(&self) -> bool {
        self.start.is_some()
    }

    /// Number of stops in the planning problem, start included.
    pub fn len(&self) -> usize {
        self.stops.len() + usize::from(self.start.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points in planning order: external start first (if any), then uploads.
    pub fn planning_points(&self) -> Vec<Point> {
        self.start
            .iter()
            .chain(self.stops.iter())
            .cloned()
            .collect()
    }

    /// Upload position of a planning index, or `None` for the external start.
    pub fn upload_position(&self, planning_index: usize) -> Option<usize> {
        if self.start.is_some() {
            planning_index.checked_sub(1)
        } else {
            Some(planning_index)
        }
    }
}

/// Where the route begins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartLocation {
    /// Use the set's own start if it has one, otherwise the first uploaded stop.
    #[default]
    FirstRow,
    /// Start from a user-supplied location, replacing any start already set.
    Explicit {
        latitude: f64,
        longitude: f64,
        #[serde(default = "default_start_label")]
        label: String,
    },
}

fn default_start_label() -> String {
    "Start".to_string()
}

impl StartLocation {
    pub fn resolve(&self, waypoints: &WaypointSet) -> Result<WaypointSet, ValidationError> {
        match self {
            Self::FirstRow => Ok(waypoints.clone()),
            Self::Explicit {
                latitude,
                longitude,
                label,
            } => waypoints
                .clone()
                .with_start(Point::new(label.clone(), *latitude, *longitude)),
        }
    }
}
