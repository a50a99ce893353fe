//! HTTP mapping of store errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plansculpt_core::CoreError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by every handler, rendered as `{"error", "code"}`
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let (status, code) = match &err {
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            CoreError::InvalidTask(_) => (StatusCode::BAD_REQUEST, "INVALID_TASK"),
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CoreError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            CoreError::IdentifierExhausted(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ID_EXHAUSTED")
            }
            CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            CoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        }

        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: Some(self.code.to_string()),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_core_error_status_codes() {
        let cases = [
            (CoreError::validation("bad"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                CoreError::InvalidTask("no cost".to_string()),
                StatusCode::BAD_REQUEST,
                "INVALID_TASK",
            ),
            (CoreError::not_found("Task", "1"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                CoreError::Forbidden("admins only".to_string()),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                CoreError::Conflict("already paid".to_string()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                CoreError::IdentifierExhausted("project".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "ID_EXHAUSTED",
            ),
            (
                CoreError::Database(DbErr::Custom("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }
}
