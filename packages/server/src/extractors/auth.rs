use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};

use catalog::model::{FileEntry, Identity};
use catalog::policy;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated account extracted from the request.
///
/// Accepts a session token (`Authorization: Bearer <jwt>`), the long-lived
/// API credential in the same header (what uploader tools send), or an
/// `X-API-Token` header. The account row is re-fetched on every request so
/// renames and credential resets take effect immediately.
pub struct CurrentUser {
    pub identity: Identity,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.identity.is_admin {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Whether this account may rename, delete or re-share the entry.
    pub fn can_manage(&self, entry: &FileEntry) -> bool {
        policy::can_manage(entry, &self.identity)
    }

    pub fn require_manage(&self, entry: &FileEntry) -> Result<(), AppError> {
        if self.can_manage(entry) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn api_token_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("x-api-token")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    if let Some(token) = bearer_token(parts) {
        if let Ok(claims) = jwt::verify(token, &state.config.auth.jwt_secret) {
            let identity = state
                .store
                .find_account(&claims.sub)
                .await?
                .ok_or(AppError::TokenInvalid)?;
            return Ok(CurrentUser { identity });
        }

        // Uploader clients put the API credential in the same header.
        let identity = state
            .store
            .resolve_by_api_credential(token)
            .await?
            .ok_or(AppError::TokenInvalid)?;
        return Ok(CurrentUser { identity });
    }

    if let Some(token) = api_token_header(parts) {
        let identity = state
            .store
            .resolve_by_api_credential(token)
            .await?
            .ok_or(AppError::TokenInvalid)?;
        return Ok(CurrentUser { identity });
    }

    Err(AppError::TokenMissing)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // An Authorization header without the Bearer scheme is malformed,
        // not missing.
        if parts.headers.contains_key(axum::http::header::AUTHORIZATION)
            && bearer_token(parts).is_none()
        {
            return Err(AppError::TokenInvalid);
        }

        resolve(parts, state).await
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    /// Absent credentials yield `None`; present but invalid ones still fail.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if bearer_token(parts).is_none() && api_token_header(parts).is_none() {
            return Ok(None);
        }
        resolve(parts, state).await.map(Some)
    }
}
