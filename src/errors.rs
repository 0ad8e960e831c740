// errors.rs
use crate::api::ApiError;
use thiserror::Error;

/// Errors surfaced by route handlers: routing and input problems, plus whatever the
/// backend or the local database reported.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Upstream Error: {0}")]
    Upstream(String),
    #[error("Request timed out. The server may be overloaded.")]
    Timeout,
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Upstream(_) => 502,
            ServerError::Timeout => 504,
            ServerError::DbError(_) | ServerError::InternalError => 500,
        }
    }
}

impl From<ApiError> for ServerError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound => ServerError::NotFound,
            ApiError::Timeout => ServerError::Timeout,
            ApiError::Unauthorized { .. } => ServerError::Unauthorized(err.to_string()),
            ApiError::MissingToken => ServerError::Unauthorized(err.to_string()),
            ApiError::InvalidRequest(msg) => ServerError::BadRequest(msg),
            ApiError::Network(_)
            | ApiError::Status { .. }
            | ApiError::Decode(_)
            | ApiError::UnexpectedShape(_) => ServerError::Upstream(err.to_string()),
        }
    }
}
