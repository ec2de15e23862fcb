//! Error types for coordinates, routing, filtering and configuration.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("coordinate component is not a finite number")]
    NotFinite,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Failure of a single routing lookup.
///
/// These never cross the batch boundary: the resolver logs them and degrades
/// the lookup to a miss.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Transport(#[from] reqwest::Error),

    // Non-"Ok" status reported by the provider, with its message if any
    #[error("routing provider returned status {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { code: String, message: Option<String> },

    #[error("failed to parse routing response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("routing response contained no route")]
    NoRoute,

    #[error("routing response carried an unusable distance: {0}")]
    InvalidDistance(f64),

    #[error("routing provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("radius must be a finite, non-negative number of kilometers, got {0}")]
    InvalidRadius(f64),

    #[error("failed to build resolution thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised while wiring the subsystem together.
#[derive(Error, Debug)]
pub enum ProximityError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
