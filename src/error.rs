use axum::{extract::rejection::JsonRejection, http::StatusCode};
use tracing::error;

use crate::storage::StoreError;

/// Failure kinds surfaced by the user, todo and auth services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) | Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for (StatusCode, String) {
    fn from(e: ServiceError) -> Self {
        let status = e.status();
        if status.is_server_error() {
            error!(error = %e, "request failed");
        }
        (status, e.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Any unreadable request body (bad JSON, wrong field types, missing
/// content type) is a plain 400.
pub fn bad_body(rejection: JsonRejection) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, rejection.body_text())
}
