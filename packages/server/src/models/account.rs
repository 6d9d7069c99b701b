use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use catalog::model::{AccountUpdate, CopyUrlMode, Identity};

use crate::models::file::FileResponse;

/// An account as seen by its owner.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AccountResponse {
    pub id: String,
    #[schema(example = "alice")]
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub hide_media_default: bool,
    pub copy_url_mode: CopyUrlMode,
    /// Free-form uploader configuration blob.
    pub client_config: Option<String>,
    /// Long-lived API credential used by uploader tools.
    pub api_credential: Option<String>,
}

impl From<Identity> for AccountResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            is_admin: identity.is_admin,
            created_at: identity.created_at,
            hide_media_default: identity.hide_media_default,
            copy_url_mode: identity.copy_url_mode,
            client_config: identity.client_config,
            api_credential: identity.api_credential,
        }
    }
}

/// Partial profile update. Omitted fields are left untouched; sending
/// `"client_config": null` clears the stored blob.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateAccountRequest {
    #[schema(example = "alice")]
    pub username: Option<String>,
    pub password: Option<String>,
    pub hide_media_default: Option<bool>,
    pub copy_url_mode: Option<CopyUrlMode>,
    /// Distinguishes "leave alone" (field absent) from "clear" (null).
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub client_config: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<UpdateAccountRequest> for AccountUpdate {
    fn from(request: UpdateAccountRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            hide_media_default: request.hide_media_default,
            copy_url_mode: request.copy_url_mode,
            client_config: request.client_config,
        }
    }
}

/// Profile block of the takeout document. Credentials stay out of it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ExportAccount {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub hide_media_default: bool,
    pub copy_url_mode: CopyUrlMode,
    pub client_config: Option<String>,
}

impl From<Identity> for ExportAccount {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            created_at: identity.created_at,
            hide_media_default: identity.hide_media_default,
            copy_url_mode: identity.copy_url_mode,
            client_config: identity.client_config,
        }
    }
}

/// Downloadable takeout of an account and its files.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ExportResponse {
    pub user: ExportAccount,
    pub files: Vec<FileResponse>,
}

/// A ShareX custom uploader definition (`.sxcu`).
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SharexConfig {
    pub version: String,
    pub name: String,
    pub destination_type: String,
    pub request_method: String,
    #[serde(rename = "RequestURL")]
    pub request_url: String,
    pub body: String,
    pub file_form_name: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "DeletionURL")]
    pub deletion_url: String,
    pub error_message: String,
    pub headers: SharexHeaders,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SharexHeaders {
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

impl SharexConfig {
    /// Build the uploader definition for an account. The copied URL follows
    /// the account's `copy_url_mode`.
    pub fn build(identity: &Identity, api_credential: &str, base: &str) -> Self {
        let url_template = match identity.copy_url_mode {
            CopyUrlMode::View => "$json:view_url$",
            CopyUrlMode::Download => "$json:download_url$",
            CopyUrlMode::Share => "$json:share_url$",
            CopyUrlMode::Raw => "$json:share_raw_url$",
        };

        Self {
            version: "14.1.0".into(),
            name: "Skiff Upload".into(),
            destination_type: "ImageUploader, FileUploader".into(),
            request_method: "POST".into(),
            request_url: format!("{base}/api/v1/files"),
            body: "MultipartFormData".into(),
            file_form_name: "files".into(),
            url: url_template.into(),
            deletion_url: "$json:download_url$".into(),
            error_message: "$json:message$".into(),
            headers: SharexHeaders {
                authorization: format!("Bearer {api_credential}"),
            },
        }
    }
}
