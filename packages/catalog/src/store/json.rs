use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{self, AccountUpdate, FileEntry, Identity, NewFileEntry};
use crate::store::traits::{Catalog, IdentityStore};
use crate::{password, token};

/// On-disk snapshot: the whole store as one serialized document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Document {
    accounts: BTreeMap<String, Identity>,
    entries: BTreeMap<String, FileEntry>,
}

impl Document {
    fn username_taken(&self, lower: &str, exclude: Option<&str>) -> bool {
        self.accounts.values().any(|account| {
            account.username.to_lowercase() == lower && Some(account.id.as_str()) != exclude
        })
    }

    fn token_holder(&self, share_token: &str) -> Option<&FileEntry> {
        self.entries
            .values()
            .find(|entry| entry.share_token.as_deref() == Some(share_token))
    }
}

/// Flat-document adapter: everything lives in one JSON file.
///
/// Mutations run against a copy behind the write lock and are published to
/// memory only after the snapshot reached disk, so a failed write leaves
/// both the file and the in-memory state untouched.
pub struct JsonStore {
    path: PathBuf,
    doc: RwLock<Document>,
}

impl JsonStore {
    /// Load the document at `path`, starting empty if none exists yet.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let doc = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    /// Write the snapshot to a temp file, then rename it over the live one.
    async fn persist(&self, doc: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let temp_path = self
            .path
            .with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, &bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn mutate<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Document) -> Result<T, StoreError>,
    {
        let mut guard = self.doc.write().await;
        let mut next = guard.clone();
        let out = op(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl Catalog for JsonStore {
    async fn create(
        &self,
        new: NewFileEntry,
        owner: &Identity,
    ) -> Result<FileEntry, StoreError> {
        let original_name = model::normalize_entry_name(&new.original_name)?;
        let owner_id = owner.id.clone();
        let owner_username = owner.username.clone();

        self.mutate(move |doc| {
            let mut id = token::file_id();
            while doc.entries.contains_key(&id) {
                id = token::file_id();
            }

            let stored_name = model::stored_name_for(&id, &original_name);
            let entry = FileEntry {
                id: id.clone(),
                original_name,
                stored_name,
                size: new.size,
                content_type: new.content_type,
                uploaded_at: chrono::Utc::now(),
                owner_id,
                owner_username,
                share_token: None,
            };
            doc.entries.insert(id, entry.clone());
            Ok(entry)
        })
        .await
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<FileEntry>, StoreError> {
        let doc = self.doc.read().await;
        let mut entries: Vec<FileEntry> = doc
            .entries
            .values()
            .filter(|entry| owner.is_none_or(|o| entry.owner_id == o))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(entries)
    }

    async fn total_size(&self, owner: Option<&str>) -> Result<u64, StoreError> {
        let doc = self.doc.read().await;
        Ok(doc
            .entries
            .values()
            .filter(|entry| owner.is_none_or(|o| entry.owner_id == o))
            .map(|entry| entry.size)
            .sum())
    }

    async fn get(&self, id: &str) -> Result<FileEntry, StoreError> {
        let doc = self.doc.read().await;
        doc.entries
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<FileEntry, StoreError> {
        let new_name = model::normalize_entry_name(new_name)?;
        let id = id.to_string();

        self.mutate(move |doc| {
            let entry = doc
                .entries
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
            entry.original_name = new_name;
            Ok(entry.clone())
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<FileEntry, StoreError> {
        let id = id.to_string();

        self.mutate(move |doc| {
            doc.entries
                .remove(&id)
                .ok_or_else(|| StoreError::NotFound(format!("file {id}")))
        })
        .await
    }

    async fn set_share_token(
        &self,
        id: &str,
        share_token: &str,
    ) -> Result<FileEntry, StoreError> {
        let id = id.to_string();
        let share_token = share_token.to_string();

        self.mutate(move |doc| {
            if !doc.entries.contains_key(&id) {
                return Err(StoreError::NotFound(format!("file {id}")));
            }
            if let Some(holder) = doc.token_holder(&share_token) {
                if holder.id != id {
                    return Err(StoreError::Conflict(
                        "The requested link is already taken".to_string(),
                    ));
                }
            }

            let entry = doc
                .entries
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
            entry.share_token = Some(share_token);
            Ok(entry.clone())
        })
        .await
    }

    async fn clear_share_token(&self, id: &str) -> Result<FileEntry, StoreError> {
        let id = id.to_string();

        self.mutate(move |doc| {
            let entry = doc
                .entries
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
            entry.share_token = None;
            Ok(entry.clone())
        })
        .await
    }

    async fn find_by_token(&self, share_token: &str) -> Result<FileEntry, StoreError> {
        let doc = self.doc.read().await;
        doc.token_holder(share_token)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("shared file".to_string()))
    }

    async fn propagate_owner_rename(
        &self,
        owner_id: &str,
        new_username: &str,
    ) -> Result<(), StoreError> {
        let owner_id = owner_id.to_string();
        let new_username = new_username.to_string();

        self.mutate(move |doc| {
            for entry in doc
                .entries
                .values_mut()
                .filter(|entry| entry.owner_id == owner_id)
            {
                entry.owner_username = new_username.clone();
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl IdentityStore for JsonStore {
    async fn create_account(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        let username = model::normalize_username(username)?;
        model::validate_password(password)?;
        let password_hash = password::hash(password)?;

        self.mutate(move |doc| {
            if doc.username_taken(&username.to_lowercase(), None) {
                return Err(StoreError::Conflict(
                    "The username is already taken".to_string(),
                ));
            }

            let mut id = token::account_id();
            while doc.accounts.contains_key(&id) {
                id = token::account_id();
            }

            let identity = Identity {
                id: id.clone(),
                username,
                password_hash,
                is_admin: doc.accounts.is_empty(),
                created_at: chrono::Utc::now(),
                hide_media_default: false,
                copy_url_mode: Default::default(),
                client_config: None,
                api_credential: Some(token::api_credential()),
            };
            doc.accounts.insert(id, identity.clone());
            Ok(identity)
        })
        .await
    }

    async fn find_account(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        let doc = self.doc.read().await;
        Ok(doc.accounts.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let lower = username.trim().to_lowercase();
        let doc = self.doc.read().await;
        Ok(doc
            .accounts
            .values()
            .find(|account| account.username.to_lowercase() == lower)
            .cloned())
    }

    async fn has_accounts(&self) -> Result<bool, StoreError> {
        let doc = self.doc.read().await;
        Ok(!doc.accounts.is_empty())
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

        let id = id.to_string();

        self.mutate(move |doc| {
            let mut account = doc
                .accounts
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

            if let Some(username) = update.username {
                let username = model::normalize_username(&username)?;
                let lower = username.to_lowercase();
                if doc.username_taken(&lower, Some(&id)) {
                    return Err(StoreError::Conflict(
                        "The username is already taken".to_string(),
                    ));
                }
                account.username = username;
            }
            if let Some(password) = update.password {
                model::validate_password(&password)?;
                account.password_hash = password::hash(&password)?;
            }
            if let Some(hide) = update.hide_media_default {
                account.hide_media_default = hide;
            }
            if let Some(mode) = update.copy_url_mode {
                account.copy_url_mode = mode;
            }
            if let Some(client_config) = update.client_config {
                account.client_config = client_config;
            }

            doc.accounts.insert(id, account.clone());
            Ok(account)
        })
        .await
    }

    async fn regenerate_api_credential(&self, id: &str) -> Result<Identity, StoreError> {
        let id = id.to_string();

        self.mutate(move |doc| {
            let account = doc
                .accounts
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
            account.api_credential = Some(token::api_credential());
            Ok(account.clone())
        })
        .await
    }

    async fn resolve_by_api_credential(
        &self,
        credential: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let doc = self.doc.read().await;
        Ok(doc
            .accounts
            .values()
            .find(|account| account.api_credential.as_deref() == Some(credential))
            .cloned())
    }
}
