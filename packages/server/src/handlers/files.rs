use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use catalog::model::{FileEntry, NewFileEntry};
use catalog::share;
use catalog::storage::BoxReader;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::file::{
    CustomTokenRequest, FileResponse, ListFilesResponse, PreferencesInfo, RenameRequest,
    ShareLinkResponse, UploadResponse,
};
use crate::state::AppState;
use crate::utils::filename::{content_disposition, validate_upload_name};
use crate::utils::urls::base_url;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(2 * 1024 * 1024 * 1024) // 2 GB
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List files",
    description = "Lists files newest-first. Administrators see every account's files; \
        everyone else sees their own. Totals cover the same scope.",
    responses(
        (status = 200, description = "File listing", body = ListFilesResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers), fields(account_id = %current_user.identity.id))]
pub async fn list_files(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListFilesResponse>, AppError> {
    let owner = if current_user.identity.is_admin {
        None
    } else {
        Some(current_user.identity.id.as_str())
    };

    let entries = state.store.list(owner).await?;
    let total_size = state.store.total_size(owner).await?;

    let base = base_url(&state.config, &headers);
    let files = entries
        .into_iter()
        .map(|entry| FileResponse::build(entry, &current_user.identity, &base))
        .collect();

    Ok(Json(ListFilesResponse {
        files,
        total_size,
        capacity: state.quota.capacity(),
        preferences: PreferencesInfo {
            hide_media_default: current_user.identity.hide_media_default,
            copy_url_mode: current_user.identity.copy_url_mode,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "Files",
    operation_id = "uploadFiles",
    summary = "Upload files",
    description = "Accepts one or more `files` multipart parts. Each stored file gets a \
        share link right away. The first file's links are echoed at the response root \
        so uploader tools can read them with a flat JSON path. When the capacity would \
        be exceeded the upload stops with 413 and reports the files stored so far.",
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts"),
    responses(
        (status = 200, description = "Upload complete", body = UploadResponse),
        (status = 400, description = "No usable file parts (VALIDATION_ERROR or plain message)", body = UploadResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "Capacity exceeded; body lists files stored before the rejection", body = UploadResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers, multipart), fields(account_id = %current_user.identity.id))]
pub async fn upload_files(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let base = base_url(&state.config, &headers);
    let mut saved: Vec<FileResponse> = Vec::new();
    let mut saw_file_part = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("files") {
            continue; // Ignore unknown fields.
        }
        saw_file_part = true;

        // Parts without a filename are skipped rather than failing the batch.
        let Some(raw_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        if raw_name.trim().is_empty() {
            continue;
        }

        let original_name = validate_upload_name(&raw_name)
            .map_err(|msg| AppError::Validation(msg.into()))?
            .to_string();
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .or_else(|| {
                mime_guess::from_path(&original_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let (staged, size) = stage_field(field).await?;

        if let Err(err) = state.quota.check(state.store.as_ref(), None, size).await {
            let _ = tokio::fs::remove_file(&staged).await;
            tracing::warn!(requested = size, "Upload rejected, capacity exhausted");
            let message = match err {
                catalog::StoreError::Validation(msg) => msg,
                other => return Err(other.into()),
            };
            return Ok((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(UploadResponse::new(message, saved)),
            )
                .into_response());
        }

        let entry = match state
            .store
            .create(
                NewFileEntry {
                    original_name,
                    content_type,
                    size,
                },
                &current_user.identity,
            )
            .await
        {
            Ok(entry) => entry,
            Err(err) => {
                let _ = tokio::fs::remove_file(&staged).await;
                return Err(err.into());
            }
        };

        if let Err(err) = persist_staged(&state, &staged, &entry).await {
            let _ = tokio::fs::remove_file(&staged).await;
            // The row without its bytes is useless; drop it again.
            let _ = state.store.delete(&entry.id).await;
            return Err(err);
        }
        let _ = tokio::fs::remove_file(&staged).await;

        let entry = share::ensure_token(state.store.as_ref(), &entry.id).await?;
        saved.push(FileResponse::build(entry, &current_user.identity, &base));
    }

    if !saw_file_part {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(UploadResponse::new("No files were submitted", vec![])),
        )
            .into_response());
    }
    if saved.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(UploadResponse::new("No files were uploaded", vec![])),
        )
            .into_response());
    }

    Ok(Json(UploadResponse::new("Upload complete", saved)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "File metadata",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers))]
pub async fn get_file(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let entry = fetch_managed(&state, &current_user, &id).await?;
    let base = base_url(&state.config, &headers);
    Ok(Json(FileResponse::build(entry, &current_user.identity, &base)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/files/{id}",
    tag = "Files",
    operation_id = "renameFile",
    summary = "Rename a file",
    description = "Changes the display name. The stored content and its links stay as \
        they are.",
    params(("id" = String, Path, description = "File id")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Renamed", body = FileResponse),
        (status = 400, description = "Empty name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers, payload))]
pub async fn rename_file(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RenameRequest>,
) -> Result<Json<FileResponse>, AppError> {
    fetch_managed(&state, &current_user, &id).await?;

    let entry = state.store.rename(&id, &payload.name).await?;
    let base = base_url(&state.config, &headers);
    Ok(Json(FileResponse::build(entry, &current_user.identity, &base)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the catalog entry, its share link and the stored bytes.",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state))]
pub async fn delete_file(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_managed(&state, &current_user, &id).await?;

    let removed = state.store.delete(&id).await?;
    if let Err(e) = state.blobs.delete(&removed.stored_name).await {
        // The entry is gone; orphaned bytes only waste space.
        tracing::warn!(file = %removed.id, "Failed to remove stored bytes: {e}");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}/view",
    tag = "Files",
    operation_id = "viewFile",
    summary = "View file content inline",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state))]
pub async fn view_file(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let entry = fetch_managed(&state, &current_user, &id).await?;
    serve_blob(&state, &entry, false).await
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download file content",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File content as attachment"),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state))]
pub async fn download_file(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let entry = fetch_managed(&state, &current_user, &id).await?;
    serve_blob(&state, &entry, true).await
}

#[utoipa::path(
    post,
    path = "/api/v1/files/{id}/share",
    tag = "Sharing",
    operation_id = "createShareLink",
    summary = "Create a share link",
    description = "Ensures the file has a share token, generating one if needed. \
        Calling it again returns the existing link.",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "Share link", body = ShareLinkResponse),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers))]
pub async fn create_share_link(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ShareLinkResponse>, AppError> {
    fetch_managed(&state, &current_user, &id).await?;

    let entry = share::ensure_token(state.store.as_ref(), &id).await?;
    let token = entry
        .share_token
        .as_deref()
        .ok_or_else(|| AppError::Internal("share token missing after ensure".into()))?;

    let base = base_url(&state.config, &headers);
    Ok(Json(ShareLinkResponse::build(&entry, token, &base)))
}

#[utoipa::path(
    put,
    path = "/api/v1/files/{id}/share",
    tag = "Sharing",
    operation_id = "setCustomShareToken",
    summary = "Choose a custom share token",
    description = "Replaces the file's share token with a caller-chosen one. Fails with \
        409 when another file already uses it.",
    params(("id" = String, Path, description = "File id")),
    request_body = CustomTokenRequest,
    responses(
        (status = 200, description = "Token bound", body = FileResponse),
        (status = 400, description = "Malformed token (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Token taken by another file (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state, headers, payload))]
pub async fn set_custom_share_token(
    current_user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CustomTokenRequest>,
) -> Result<Json<FileResponse>, AppError> {
    fetch_managed(&state, &current_user, &id).await?;

    let entry = share::set_custom_token(state.store.as_ref(), &id, &payload.token).await?;
    let base = base_url(&state.config, &headers);
    Ok(Json(FileResponse::build(entry, &current_user.identity, &base)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}/share",
    tag = "Sharing",
    operation_id = "revokeShareLink",
    summary = "Revoke a share link",
    description = "Removes the share token. The token value becomes free for reuse and \
        the public link stops resolving.",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 204, description = "Share link removed"),
        (status = 401, description = "Unauthenticated (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current_user, state))]
pub async fn revoke_share_link(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_managed(&state, &current_user, &id).await?;

    share::revoke_token(state.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load an entry and check that the requester may manage it.
async fn fetch_managed(
    state: &AppState,
    current_user: &CurrentUser,
    id: &str,
) -> Result<FileEntry, AppError> {
    let entry = state.store.get(id).await?;
    current_user.require_manage(&entry)?;
    Ok(entry)
}

/// Stream one multipart part to a temp file, returning its path and size.
async fn stage_field(
    mut field: axum::extract::multipart::Field<'_>,
) -> Result<(PathBuf, u64), AppError> {
    let staged = std::env::temp_dir().join(format!("skiff-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&staged)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total += chunk.len() as u64;
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(total)
    }
    .await;

    match result {
        Ok(total) => Ok((staged, total)),
        Err(err) => {
            let _ = tokio::fs::remove_file(&staged).await;
            Err(err)
        }
    }
}

/// Copy a staged upload into the blob store under the entry's stored name.
async fn persist_staged(
    state: &AppState,
    staged: &PathBuf,
    entry: &FileEntry,
) -> Result<(), AppError> {
    let file = tokio::fs::File::open(staged)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
    let reader: BoxReader = Box::new(file);
    state.blobs.write_stream(&entry.stored_name, reader).await?;
    Ok(())
}

/// Stream stored bytes, inline or as attachment under the display name.
pub(crate) async fn serve_blob(
    state: &AppState,
    entry: &FileEntry,
    attachment: bool,
) -> Result<Response, AppError> {
    let reader = state.blobs.open(&entry.stored_name).await?;
    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &entry.content_type)
        .header(header::CONTENT_LENGTH, entry.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&entry.original_name, attachment),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
