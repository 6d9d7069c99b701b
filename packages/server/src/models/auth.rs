use serde::Deserialize;

use crate::error::AppError;
use crate::models::account::AccountResponse;

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (case-insensitive, 1-64 characters).
    #[schema(example = "marta")]
    pub username: String,
    /// Password (8-128 characters).
    #[schema(example = "anchor-windlass-9")]
    pub password: String,
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "marta")]
    pub username: String,
    pub password: String,
}

/// Login payloads are checked for shape only; whether the credentials are
/// right is the store's call.
pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Both username and password are required".into(),
        ));
    }
    Ok(())
}

/// Successful registration response.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    /// Session token; only issued when the new account is the first one
    /// (initial setup logs the creator in).
    pub token: Option<String>,
    pub user: AccountResponse,
}

/// Successful login response.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: AccountResponse,
}
