use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Failures returned by the game engine and its collaborators.
///
/// Every precondition violation maps onto one of these kinds; nothing in the
/// engine panics on bad moderator input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl GameError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }

    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::InvalidState(detail.into())
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::InvalidArgument(detail.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict(detail.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "not_found",
            GameError::InvalidState(_) => "invalid_state",
            GameError::InvalidArgument(_) => "invalid_argument",
            GameError::Conflict(_) => "conflict",
            GameError::Timeout(_) => "timeout",
            GameError::Storage(_) => "storage",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::InvalidState(_) | GameError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GameError::Conflict(_) => StatusCode::CONFLICT,
            GameError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GameError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub kind: &'static str,
    pub error: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse {
            success: false,
            kind: self.kind(),
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
