use std::path::Path;

use chrono::{DateTime, Utc};
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Which URL a client should copy to the clipboard after an upload.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
    sea_orm::DeriveActiveEnum, sea_orm::EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum CopyUrlMode {
    /// Authenticated file view.
    #[sea_orm(string_value = "view")]
    View,
    /// Authenticated download endpoint.
    #[sea_orm(string_value = "download")]
    Download,
    /// Public share link.
    #[sea_orm(string_value = "share")]
    Share,
    /// Public share link serving the bytes inline.
    #[sea_orm(string_value = "raw")]
    Raw,
}

impl CopyUrlMode {
    pub const ALL: &'static [CopyUrlMode] =
        &[Self::View, Self::Download, Self::Share, Self::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Download => "download",
            Self::Share => "share",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for CopyUrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for CopyUrlMode {
    fn default() -> Self {
        Self::View
    }
}

/// A registered account.
///
/// The `password_hash` is an argon2 PHC string; API layers expose profiles
/// through their own response types and never serialize it to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    /// Set for the first account created in an empty store.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub hide_media_default: bool,
    pub copy_url_mode: CopyUrlMode,
    /// Free-form uploader configuration blob (e.g. a ShareX template).
    pub client_config: Option<String>,
    /// Long-lived upload credential. Regenerable; unique across accounts.
    pub api_credential: Option<String>,
}

/// One catalog row describing an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    /// Display name; the only mutable piece of file metadata.
    pub original_name: String,
    /// On-disk name, fixed at creation. Renames never move bytes.
    pub stored_name: String,
    pub size: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub owner_id: String,
    /// Denormalized from the owner account so listings need no join.
    pub owner_username: String,
    /// Public share token; globally unique while set.
    pub share_token: Option<String>,
}

impl FileEntry {
    /// Coarse media class derived from the MIME type.
    pub fn preview_category(&self) -> &'static str {
        let content_type = self.content_type.to_ascii_lowercase();
        if content_type.starts_with("image/") {
            "image"
        } else if content_type.starts_with("video/") {
            "video"
        } else if content_type.starts_with("audio/") {
            "audio"
        } else if content_type.starts_with("text/") {
            "text"
        } else {
            "none"
        }
    }

    /// True when a browser can render the bytes inline.
    pub fn is_media(&self) -> bool {
        matches!(self.preview_category(), "image" | "video" | "audio")
    }
}

/// Input for creating a catalog entry. Id, stored name and timestamp are
/// assigned by the store.
#[derive(Clone, Debug)]
pub struct NewFileEntry {
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Partial account update. `None` fields are left untouched; the outer
/// `Option` on `client_config` distinguishes "leave alone" from "clear".
#[derive(Clone, Debug, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub hide_media_default: Option<bool>,
    pub copy_url_mode: Option<CopyUrlMode>,
    pub client_config: Option<Option<String>>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.hide_media_default.is_none()
            && self.copy_url_mode.is_none()
            && self.client_config.is_none()
    }
}

/// Derive the on-disk name for a new entry: the entry id plus the extension
/// of the original name, if it has one.
pub fn stored_name_for(id: &str, original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
        _ => id.to_string(),
    }
}

/// Normalize and validate a username. Surrounding whitespace is stripped;
/// the result must be 1-64 characters.
pub fn normalize_username(username: &str) -> Result<String, StoreError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(StoreError::Validation("A username is required".into()));
    }
    if username.chars().count() > 64 {
        return Err(StoreError::Validation(
            "Username must be at most 64 characters".into(),
        ));
    }
    Ok(username.to_string())
}

/// Password length bounds shared by registration and password changes.
pub fn validate_password(password: &str) -> Result<(), StoreError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(StoreError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// A display name for an entry must be non-empty after trimming.
pub fn normalize_entry_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("A file name is required".into()));
    }
    Ok(name.to_string())
}
