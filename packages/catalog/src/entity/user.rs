use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::CopyUrlMode;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// 24-char hex id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display form, original casing preserved.
    pub username: String,

    /// Lowercased copy backing the case-insensitive uniqueness rule.
    #[sea_orm(unique)]
    pub username_lower: String,

    pub password_hash: String,

    pub is_admin: bool,

    pub created_at: DateTimeUtc,

    pub hide_media_default: bool,

    pub copy_url_mode: CopyUrlMode,

    pub client_config: Option<String>,

    #[sea_orm(unique)]
    pub api_credential: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
