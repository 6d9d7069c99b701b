use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// 16-char hex id; also the stem of the stored name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub original_name: String,

    /// On-disk name, fixed at creation.
    pub stored_name: String,

    pub size: i64,

    pub content_type: String,

    pub uploaded_at: DateTimeUtc,

    pub owner_id: String,

    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Purposefully denormalized to avoid a JOIN on every listing.
    pub owner_username: String,

    #[sea_orm(unique)]
    pub share_token: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
