//! Error taxonomy for route planning.
//!
//! Each layer has its own error type; `PlanError` is what `plan` returns.
//! Every wrapping variant keeps the underlying cause as its `source`.

use std::time::Duration;

use thiserror::Error;

/// Malformed or empty waypoint input. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("waypoint set is empty")]
    Empty,
    /// `index` is the upload position, or `None` for an external start point.
    #[error("invalid coordinate for {label:?} (index {index:?}): lat {latitude}, lon {longitude}")]
    InvalidCoordinate {
        index: Option<usize>,
        label: String,
        latitude: f64,
        longitude: f64,
    },
}

/// Failure reported by a cost backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend has no bulk matrix operation.
    #[error("bulk matrix not supported by this provider")]
    Unsupported,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("routing service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("routing service rejected the request: {0}")]
    Rejected(String),
    #[error("invalid response from routing service: {0}")]
    InvalidResponse(String),
    #[error("invalid cost {value} from {from} to {to}")]
    InvalidCost { from: usize, to: usize, value: f64 },
}

impl ProviderError {
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// The cost matrix could not be completed. No partial matrix is produced.
#[derive(Debug, Error)]
#[error("failed to build cost matrix for {stops} stops")]
pub struct MatrixBuildError {
    pub stops: usize,
    #[source]
    pub source: ProviderError,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// Exact search refused; pick another strategy rather than retrying.
    #[error("{stops} stops exceed the exact search limit of {max}; choose another strategy")]
    ProblemTooLarge { stops: usize, max: usize },
    /// CP search found nothing within its budget; retry with a larger budget or another strategy.
    #[error("no feasible route found within {budget:?}")]
    NoSolution { budget: Duration },
    #[error("start index {start} out of range for {size} stops")]
    StartOutOfRange { start: usize, size: usize },
    /// Quantized route costs would not fit in an `i64`; lower `cost_scale`.
    #[error("arc cost {largest} at scale {cost_scale} overflows the quantized route cost")]
    CostOverflow { largest: f64, cost_scale: f64 },
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    MatrixBuild(#[from] MatrixBuildError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn matrix_build_error_keeps_provider_cause() {
        let err = PlanError::from(MatrixBuildError {
            stops: 4,
            source: ProviderError::Rejected("quota exceeded".into()),
        });

        let source = err.source().expect("matrix build error has a source");
        assert_eq!(
            source.to_string(),
            "routing service rejected the request: quota exceeded"
        );
    }

    #[test]
    fn status_transience() {
        let throttled = ProviderError::Status { status: 429, body: String::new() };
        let bad_gateway = ProviderError::Status { status: 502, body: String::new() };
        let bad_request = ProviderError::Status { status: 400, body: String::new() };

        assert!(throttled.is_transient());
        assert!(bad_gateway.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!ProviderError::Unsupported.is_transient());
    }
}
