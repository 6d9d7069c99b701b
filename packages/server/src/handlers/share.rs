use axum::extract::{Path, State};
use axum::response::Response;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::handlers::files::serve_blob;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/s/{token}",
    tag = "Sharing",
    operation_id = "fetchSharedFile",
    summary = "Fetch a shared file",
    description = "Public, unauthenticated download by share token. Knowing the token \
        is the whole authorization.",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "File content as attachment"),
        (status = 404, description = "No file with that token (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn fetch_shared(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let entry = state.store.find_by_token(&token).await?;
    serve_blob(&state, &entry, true).await
}

#[utoipa::path(
    get,
    path = "/s/{token}/raw",
    tag = "Sharing",
    operation_id = "fetchSharedFileRaw",
    summary = "Fetch a shared file inline",
    description = "Same as the plain share endpoint but served inline, so browsers \
        render media instead of downloading it.",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "File content, inline"),
        (status = 404, description = "No file with that token (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn fetch_shared_raw(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let entry = state.store.find_by_token(&token).await?;
    serve_blob(&state, &entry, false).await
}

#[utoipa::path(
    get,
    path = "/s/{token}/download",
    tag = "Sharing",
    operation_id = "downloadSharedFile",
    summary = "Download a shared file",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "File content as attachment"),
        (status = 404, description = "No file with that token (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_shared(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let entry = state.store.find_by_token(&token).await?;
    serve_blob(&state, &entry, true).await
}
