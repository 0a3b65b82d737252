//! Relay error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed send payload or missing connection identifier.
    #[error("validation error: {0}")]
    Validation(String),
    /// Backing store unreachable or write failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for RelayError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<RelayError> for (StatusCode, String) {
    fn from(e: RelayError) -> Self {
        (e.status(), e.to_string())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
