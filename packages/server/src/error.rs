use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use catalog::StoreError;
use catalog::storage::StorageError;

/// Error envelope every failing endpoint responds with.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `NOT_FOUND`, `CONFLICT`, or `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Text for humans; clients should branch on `code`.
    #[schema(example = "A file name is required")]
    pub message: String,
}

/// What went wrong with a request, as the handlers see it.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".to_string(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("Not found: {what}")),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Validation(msg) => AppError::Validation(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File content is missing".into()),
            StorageError::InvalidName(msg) => AppError::Validation(msg),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}
