use http::StatusCode;
use thiserror::Error;

/// Result type alias for aggregator operations
pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;

/// The requested concurrency count was rejected before any call was dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("calls must be at least {min}, got {requested}")]
    TooFewCalls { requested: i64, min: u32 },
}

/// Errors that can occur while serving gateway requests
#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The single call behind `/stats` failed.
    #[error("Failed to fetch data from upstream: {0}")]
    CallFailed(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AggregatorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AggregatorError::Validation(_) => StatusCode::BAD_REQUEST,
            AggregatorError::CallFailed(_) => StatusCode::BAD_GATEWAY,
            AggregatorError::InternalError(_)
            | AggregatorError::ResponseSerializationError(_)
            | AggregatorError::HttpClientError(_)
            | AggregatorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
