use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::account::AccountResponse;
use crate::models::auth::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, validate_login_request,
};
use crate::state::AppState;
use crate::utils::jwt;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Create an account",
    description = "Creates an account. The first account on an empty instance becomes the \
        administrator and receives a session token right away; afterwards only \
        administrators may create further accounts.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an administrator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, current_user, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    current_user: Option<CurrentUser>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let bootstrap = !state.store.has_accounts().await?;
    if !bootstrap {
        let current_user = current_user.ok_or(AppError::TokenMissing)?;
        current_user.require_admin()?;
    }

    let identity = state
        .store
        .create_account(&payload.username, &payload.password)
        .await?;

    let token = if bootstrap {
        tracing::info!("Initial account created, instance is now set up");
        let token = jwt::sign(
            &identity.id,
            &identity.username,
            &state.config.auth.jwt_secret,
            state.config.auth.token_days,
        )
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;
        Some(token)
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            user: AccountResponse::from(identity),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let identity = state
        .store
        .authenticate(&payload.username, &payload.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = jwt::sign(
        &identity.id,
        &identity.username,
        &state.config.auth.jwt_secret,
        state.config.auth.token_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        user: AccountResponse::from(identity),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current account",
    responses(
        (status = 200, description = "The authenticated account", body = AccountResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user), fields(account_id = %current_user.identity.id))]
pub async fn me(current_user: CurrentUser) -> Json<AccountResponse> {
    Json(AccountResponse::from(current_user.identity))
}
