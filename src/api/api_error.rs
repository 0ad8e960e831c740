use thiserror::Error;

/// Failures talking to the listings backend.
///
/// Payloads are plain strings so errors can be cloned into fallback logs and test fakes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out. The server may be overloaded.")]
    Timeout,
    #[error("Unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("Backend HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Response decode error: {0}")]
    Decode(String),
    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),
    #[error("No authentication token available")]
    MissingToken,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Listing not found")]
    NotFound,
}

impl ApiError {
    /// Transport and shape failures may be retried against the next endpoint.
    /// Auth failures and timeouts go back to the caller untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Status { .. }
                | ApiError::Decode(_)
                | ApiError::UnexpectedShape(_)
                | ApiError::NotFound
        )
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
