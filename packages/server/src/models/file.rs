use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog::model::{CopyUrlMode, FileEntry, Identity};
use catalog::policy;

/// Owner block attached to every file payload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OwnerInfo {
    pub id: String,
    #[schema(example = "alice")]
    pub username: String,
}

/// One catalog entry as seen by an API client.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    #[schema(example = "d41d8cd98f00b204")]
    pub id: String,
    /// Display name of the file.
    #[schema(example = "screenshot.png")]
    pub name: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[schema(example = "image/png")]
    pub content_type: String,
    /// Coarse preview class: `image`, `video`, `audio`, `text` or `none`.
    #[schema(example = "image")]
    pub preview_type: String,
    /// Whether the requesting account may rename, delete or re-share.
    pub can_manage: bool,
    /// Whether a public share link exists.
    pub is_public: bool,
    pub share_token: Option<String>,
    /// Authenticated inline view.
    pub view_url: String,
    /// Authenticated download.
    pub download_url: String,
    /// Public share link, when shared.
    pub share_url: Option<String>,
    /// Direct media link for shared image/video/audio files; equals
    /// `share_url` otherwise.
    pub share_raw_url: Option<String>,
    pub owner: OwnerInfo,
}

impl FileResponse {
    pub fn build(entry: FileEntry, viewer: &Identity, base: &str) -> Self {
        let can_manage = policy::can_manage(&entry, viewer);
        let preview_type = entry.preview_category().to_string();
        let is_media = entry.is_media();

        let view_url = format!("{base}/api/v1/files/{}/view", entry.id);
        let download_url = format!("{base}/api/v1/files/{}/download", entry.id);
        let share_url = entry
            .share_token
            .as_deref()
            .map(|token| format!("{base}/s/{token}"));
        let share_raw_url = entry.share_token.as_deref().map(|token| {
            if is_media {
                format!("{base}/s/{token}/raw")
            } else {
                format!("{base}/s/{token}")
            }
        });

        Self {
            name: entry.original_name,
            size: entry.size,
            uploaded_at: entry.uploaded_at,
            content_type: entry.content_type,
            preview_type,
            can_manage,
            is_public: entry.share_token.is_some(),
            share_token: entry.share_token,
            view_url,
            download_url,
            share_url,
            share_raw_url,
            owner: OwnerInfo {
                id: entry.owner_id,
                username: entry.owner_username,
            },
            id: entry.id,
        }
    }
}

/// Preference flags echoed with every listing so clients can render
/// without a second request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PreferencesInfo {
    pub hide_media_default: bool,
    pub copy_url_mode: CopyUrlMode,
}

/// Response body for the file listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ListFilesResponse {
    pub files: Vec<FileResponse>,
    /// Total bytes in the listing scope.
    pub total_size: u64,
    /// Configured storage capacity in bytes.
    pub capacity: u64,
    pub preferences: PreferencesInfo,
}

/// Response body for an upload.
///
/// The first file's links are duplicated at the root so uploader tools can
/// read them with a flat JSON path.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = "Upload complete")]
    pub message: String,
    pub files: Vec<FileResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_raw_url: Option<String>,
}

impl UploadResponse {
    pub fn new(message: impl Into<String>, files: Vec<FileResponse>) -> Self {
        let mut response = Self {
            message: message.into(),
            url: None,
            view_url: None,
            download_url: None,
            share_url: None,
            share_raw_url: None,
            files,
        };

        if let Some(first) = response.files.first() {
            response.url = Some(first.view_url.clone());
            response.view_url = Some(first.view_url.clone());
            response.download_url = Some(first.download_url.clone());
            response.share_url = first.share_url.clone();
            response.share_raw_url = first.share_raw_url.clone();
        }

        response
    }
}

/// Request body for renaming a file.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenameRequest {
    /// New display name.
    #[schema(example = "report-final.pdf")]
    pub name: String,
}

/// Request body for choosing a custom share token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CustomTokenRequest {
    /// Desired token: 4-64 characters from `A-Z a-z 0-9 _ -`.
    #[schema(example = "launch-poster")]
    pub token: String,
}

/// Response body after creating a share link.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ShareLinkResponse {
    pub share_token: String,
    pub share_url: String,
    /// Direct media link; only set for image/video/audio files.
    pub share_raw_url: Option<String>,
}

impl ShareLinkResponse {
    pub fn build(entry: &FileEntry, token: &str, base: &str) -> Self {
        let share_raw_url = if entry.is_media() {
            Some(format!("{base}/s/{token}/raw"))
        } else {
            None
        };

        Self {
            share_token: token.to_string(),
            share_url: format!("{base}/s/{token}"),
            share_raw_url,
        }
    }
}
