use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use likhlo_types::api::MessageResponse;

/// Every failure a handler can report. Each kind maps to exactly one HTTP
/// status; the message is what the client sees in `{"msg": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or query failed validation.
    #[error("{0}")]
    Validation(String),

    /// Sign-in with an unknown email or a wrong password.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing, malformed or unverifiable bearer token.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Sign-up with an email or username that is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Store or runtime failure. Logged, never shown to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let msg = match &self {
            Self::Internal(e) => {
                error!("Request failed: {:#}", e);
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };

        (self.status_code(), Json(MessageResponse { msg })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
