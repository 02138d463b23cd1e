//! Store and API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// What went wrong inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// A user with that name already exists.
    #[display("duplicate username")]
    DuplicateUsername,
    /// A handler panicked while holding the store lock.
    #[display("lock poisoned")]
    LockPoisoned,
}

/// Store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error ({}): {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Error category.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub message: String,
}

/// Error returned by REST handlers.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ApiError {
    /// Malformed id, body or query.
    #[display("{}", _0)]
    BadRequest(#[error(not(source))] String),
    /// No record with that id.
    #[display("{}", _0)]
    NotFound(#[error(not(source))] String),
    /// The store failed.
    #[display("{}", _0)]
    Internal(#[error(not(source))] String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::DuplicateUsername => Self::BadRequest("Username already exists".into()),
            StoreErrorKind::LockPoisoned => {
                warn!(error = %err, "Store unavailable");
                Self::Internal("Internal server error".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = %status, message = %self, "Request failed");
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let duplicate = ApiError::from(StoreError::new(StoreErrorKind::DuplicateUsername, "taken"));
        assert_eq!(duplicate, ApiError::BadRequest("Username already exists".into()));
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

        let poisoned = ApiError::from(StoreError::new(StoreErrorKind::LockPoisoned, "poisoned"));
        assert_eq!(poisoned.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(poisoned.to_string(), "Internal server error");
        assert!(std::error::Error::source(&poisoned).is_none());
    }
}
