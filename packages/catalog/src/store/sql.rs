use std::time::Duration;

use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Index, SqliteQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{file, user};
use crate::error::StoreError;
use crate::model::{self, AccountUpdate, CopyUrlMode, FileEntry, Identity, NewFileEntry};
use crate::password;
use crate::store::traits::{Catalog, IdentityStore};
use crate::token;

/// Relational adapter backed by SQLite through SeaORM.
///
/// Uniqueness rules (lowercased username, API credential, share token) are
/// enforced by unique columns; a violated constraint surfaces as
/// `StoreError::Conflict`.
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    /// Connect, sync the schema and ensure secondary indexes.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let mut opt = ConnectOptions::new(url.to_owned());

        opt.max_connections(16)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;
        db.get_schema_registry("catalog::entity::*")
            .sync(&db)
            .await?;
        ensure_indexes(&db).await?;

        Ok(Self { db })
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Per-owner listings sorted by upload time:
    // SELECT * FROM files WHERE owner_id = ? ORDER BY uploaded_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_files_owner_uploaded")
        .table(file::Entity)
        .col(file::Column::OwnerId)
        .col(file::Column::UploadedAt)
        .to_string(SqliteQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_files_owner_uploaded exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_files_owner_uploaded: {}", e);
        }
    }

    Ok(())
}

fn conflict_or_db(err: DbErr, conflict_message: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict(conflict_message.to_string())
        }
        _ => StoreError::from(err),
    }
}

impl From<user::Model> for Identity {
    fn from(row: user::Model) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
            hide_media_default: row.hide_media_default,
            copy_url_mode: row.copy_url_mode,
            client_config: row.client_config,
            api_credential: row.api_credential,
        }
    }
}

impl From<file::Model> for FileEntry {
    fn from(row: file::Model) -> Self {
        Self {
            id: row.id,
            original_name: row.original_name,
            stored_name: row.stored_name,
            size: Ord::max(row.size, 0) as u64,
            content_type: row.content_type,
            uploaded_at: row.uploaded_at,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            share_token: row.share_token,
        }
    }
}

#[async_trait]
impl Catalog for SqlStore {
    async fn create(
        &self,
        new: NewFileEntry,
        owner: &Identity,
    ) -> Result<FileEntry, StoreError> {
        let original_name = model::normalize_entry_name(&new.original_name)?;
        let id = token::file_id();
        let stored_name = model::stored_name_for(&id, &original_name);

        let row = file::ActiveModel {
            id: Set(id),
            original_name: Set(original_name),
            stored_name: Set(stored_name),
            size: Set(new.size as i64),
            content_type: Set(new.content_type),
            uploaded_at: Set(chrono::Utc::now()),
            owner_id: Set(owner.id.clone()),
            owner_username: Set(owner.username.clone()),
            share_token: Set(None),
            ..Default::default()
        };

        Ok(row.insert(&self.db).await?.into())
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<FileEntry>, StoreError> {
        let mut select = file::Entity::find();
        if let Some(owner_id) = owner {
            select = select.filter(file::Column::OwnerId.eq(owner_id));
        }

        let rows = select
            .order_by(file::Column::UploadedAt, Order::Desc)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(FileEntry::from).collect())
    }

    async fn total_size(&self, owner: Option<&str>) -> Result<u64, StoreError> {
        let mut select = file::Entity::find();
        if let Some(owner_id) = owner {
            select = select.filter(file::Column::OwnerId.eq(owner_id));
        }

        let total = select
            .select_only()
            .column_as(file::Column::Size.sum(), "total")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await?;

        Ok(Ord::max(total.flatten().unwrap_or(0), 0) as u64)
    }

    async fn get(&self, id: &str) -> Result<FileEntry, StoreError> {
        file::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(FileEntry::from)
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<FileEntry, StoreError> {
        let new_name = model::normalize_entry_name(new_name)?;

        let txn = self.db.begin().await?;
        let existing = file::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;

        let mut active: file::ActiveModel = existing.into();
        active.original_name = Set(new_name);
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    async fn delete(&self, id: &str) -> Result<FileEntry, StoreError> {
        let txn = self.db.begin().await?;
        let existing = file::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;

        file::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(existing.into())
    }

    async fn set_share_token(
        &self,
        id: &str,
        share_token: &str,
    ) -> Result<FileEntry, StoreError> {
        // Single conditional UPDATE; the unique column makes the
        // check-and-set atomic.
        let result = file::Entity::update_many()
            .col_expr(
                file::Column::ShareToken,
                Expr::value(Some(share_token.to_string())),
            )
            .filter(file::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| conflict_or_db(e, "The requested link is already taken"))?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("file {id}")));
        }

        self.get(id).await
    }

    async fn clear_share_token(&self, id: &str) -> Result<FileEntry, StoreError> {
        let result = file::Entity::update_many()
            .col_expr(file::Column::ShareToken, Expr::value(None::<String>))
            .filter(file::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("file {id}")));
        }

        self.get(id).await
    }

    async fn find_by_token(&self, share_token: &str) -> Result<FileEntry, StoreError> {
        file::Entity::find()
            .filter(file::Column::ShareToken.eq(share_token))
            .one(&self.db)
            .await?
            .map(FileEntry::from)
            .ok_or_else(|| StoreError::NotFound("shared file".to_string()))
    }

    async fn propagate_owner_rename(
        &self,
        owner_id: &str,
        new_username: &str,
    ) -> Result<(), StoreError> {
        file::Entity::update_many()
            .col_expr(
                file::Column::OwnerUsername,
                Expr::value(new_username.to_string()),
            )
            .filter(file::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl IdentityStore for SqlStore {
    async fn create_account(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        let username = model::normalize_username(username)?;
        model::validate_password(password)?;
        let password_hash = password::hash(password)?;

        // The count and the insert share a transaction so only the first
        // committed account can become the administrator.
        let txn = self.db.begin().await?;
        let existing = user::Entity::find().count(&txn).await?;

        let row = user::ActiveModel {
            id: Set(token::account_id()),
            username_lower: Set(username.to_lowercase()),
            username: Set(username),
            password_hash: Set(password_hash),
            is_admin: Set(existing == 0),
            created_at: Set(chrono::Utc::now()),
            hide_media_default: Set(false),
            copy_url_mode: Set(CopyUrlMode::View),
            client_config: Set(None),
            api_credential: Set(Some(token::api_credential())),
        };

        let created = row
            .insert(&txn)
            .await
            .map_err(|e| conflict_or_db(e, "The username is already taken"))?;
        txn.commit().await?;

        Ok(created.into())
    }

    async fn find_account(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        let found = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(found.map(Identity::from))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let found = user::Entity::find()
            .filter(user::Column::UsernameLower.eq(username.trim().to_lowercase()))
            .one(&self.db)
            .await?;
        Ok(found.map(Identity::from))
    }

    async fn has_accounts(&self) -> Result<bool, StoreError> {
        Ok(user::Entity::find().count(&self.db).await? > 0)
    }

    async fn update_account(
        &self,
        id: &str,
        update: AccountUpdate,
    ) -> Result<Identity, StoreError> {
        if update.is_empty() {
            return self
                .find_account(id)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("account {id}")));
        }

        let txn = self.db.begin().await?;
        let existing = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = update.username {
            let username = model::normalize_username(&username)?;
            active.username_lower = Set(username.to_lowercase());
            active.username = Set(username);
        }
        if let Some(password) = update.password {
            model::validate_password(&password)?;
            active.password_hash = Set(password::hash(&password)?);
        }
        if let Some(hide) = update.hide_media_default {
            active.hide_media_default = Set(hide);
        }
        if let Some(mode) = update.copy_url_mode {
            active.copy_url_mode = Set(mode);
        }
        if let Some(client_config) = update.client_config {
            active.client_config = Set(client_config);
        }

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| conflict_or_db(e, "The username is already taken"))?;
        txn.commit().await?;

        Ok(updated.into())
    }

    async fn regenerate_api_credential(&self, id: &str) -> Result<Identity, StoreError> {
        let txn = self.db.begin().await?;
        let existing = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

        let mut active: user::ActiveModel = existing.into();
        active.api_credential = Set(Some(token::api_credential()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    async fn resolve_by_api_credential(
        &self,
        credential: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let found = user::Entity::find()
            .filter(user::Column::ApiCredential.eq(credential))
            .one(&self.db)
            .await?;
        Ok(found.map(Identity::from))
    }
}
