use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use tracing::instrument;

use catalog::model::AccountUpdate;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::account::{
    AccountResponse, ExportAccount, ExportResponse, SharexConfig, UpdateAccountRequest,
};
use crate::models::file::FileResponse;
use crate::state::AppState;
use crate::utils::urls::base_url;

#[utoipa::path(
    get,
    path = "/api/v1/account",
    tag = "Account",
    operation_id = "getAccount",
    summary = "Account profile",
    responses(
        (status = 200, description = "The requester's account", body = AccountResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user), fields(account_id = %current_user.identity.id))]
pub async fn get_account(current_user: CurrentUser) -> Json<AccountResponse> {
    Json(AccountResponse::from(current_user.identity))
}

#[utoipa::path(
    patch,
    path = "/api/v1/account",
    tag = "Account",
    operation_id = "updateAccount",
    summary = "Update the account profile",
    description = "Partial update of username, password and preferences. A username \
        change is written through to the owner name shown on the account's files.",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 400, description = "Rejected value (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Username already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, payload), fields(account_id = %current_user.identity.id))]
pub async fn update_account(
    current_user: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let update = AccountUpdate::from(payload);
    let previous_username = current_user.identity.username.clone();

    let updated = state
        .store
        .update_account(&current_user.identity.id, update)
        .await?;

    if updated.username != previous_username {
        state
            .store
            .propagate_owner_rename(&updated.id, &updated.username)
            .await?;
        tracing::info!(from = %previous_username, to = %updated.username, "Account renamed");
    }

    Ok(Json(AccountResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/api-credential",
    tag = "Account",
    operation_id = "regenerateApiCredential",
    summary = "Regenerate the API credential",
    description = "Issues a fresh long-lived credential. The previous value stops \
        authenticating immediately, so uploader configs must be refreshed.",
    responses(
        (status = 200, description = "Account with the new credential", body = AccountResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state), fields(account_id = %current_user.identity.id))]
pub async fn regenerate_api_credential(
    current_user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, AppError> {
    let updated = state
        .store
        .regenerate_api_credential(&current_user.identity.id)
        .await?;
    Ok(Json(AccountResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/export",
    tag = "Account",
    operation_id = "exportAccount",
    summary = "Export account data",
    description = "A downloadable JSON document with the profile and every file entry \
        the account owns. Password hashes and credentials stay out of it.",
    responses(
        (status = 200, description = "Takeout document", body = ExportResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers), fields(account_id = %current_user.identity.id))]
pub async fn export_account(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let base = base_url(&state.config, &headers);
    let entries = state.store.list(Some(&current_user.identity.id)).await?;
    let files = entries
        .into_iter()
        .map(|entry| FileResponse::build(entry, &current_user.identity, &base))
        .collect();

    let disposition = format!(
        "attachment; filename=skiff-export-{}.json",
        current_user.identity.username
    );
    let export = ExportResponse {
        user: ExportAccount::from(current_user.identity),
        files,
    };

    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(export),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/sharex",
    tag = "Account",
    operation_id = "sharexConfig",
    summary = "ShareX uploader config",
    description = "A ready-to-import `.sxcu` uploader definition wired to this server \
        and the account's API credential. A missing credential is minted on the fly.",
    responses(
        (status = 200, description = "Uploader definition", body = SharexConfig),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers), fields(account_id = %current_user.identity.id))]
pub async fn sharex_config(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let identity = if current_user.identity.api_credential.is_some() {
        current_user.identity
    } else {
        state
            .store
            .regenerate_api_credential(&current_user.identity.id)
            .await?
    };
    let credential = identity
        .api_credential
        .clone()
        .ok_or_else(|| AppError::Internal("API credential missing after issue".into()))?;

    let base = base_url(&state.config, &headers);
    let config = SharexConfig::build(&identity, &credential, &base);

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=skiff.sxcu".to_string(),
        )],
        Json(config),
    ))
}
