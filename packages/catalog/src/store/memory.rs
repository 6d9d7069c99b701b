use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{self, AccountUpdate, FileEntry, Identity, NewFileEntry};
use crate::store::traits::{Catalog, IdentityStore};
use crate::{password, token};

/// Unique-key lookups, kept in step with the row tables.
#[derive(Default)]
struct Indexes {
    /// lowercased username -> account id
    usernames: HashMap<String, String>,
    /// share token -> entry id
    tokens: HashMap<String, String>,
    /// api credential -> account id
    credentials: HashMap<String, String>,
}

/// In-process document-store adapter. State is lost on restart.
///
/// Row tables are concurrent maps; every mutation holds the index write
/// lock, which doubles as the single-writer boundary keeping unique keys
/// and rows in step. Lock order is always indexes first, rows second.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<String, Identity>,
    entries: DashMap<String, FileEntry>,
    indexes: RwLock<Indexes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn create(
        &self,
        new: NewFileEntry,
        owner: &Identity,
    ) -> Result<FileEntry, StoreError> {
        let original_name = model::normalize_entry_name(&new.original_name)?;

        let _guard = self.indexes.write().await;
        let mut id = token::file_id();
        while self.entries.contains_key(&id) {
            id = token::file_id();
        }

        let entry = FileEntry {
            stored_name: model::stored_name_for(&id, &original_name),
            id: id.clone(),
            original_name,
            size: new.size,
            content_type: new.content_type,
            uploaded_at: chrono::Utc::now(),
            owner_id: owner.id.clone(),
            owner_username: owner.username.clone(),
            share_token: None,
        };
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<FileEntry>, StoreError> {
        let mut entries: Vec<FileEntry> = self
            .entries
            .iter()
            .filter(|kv| owner.is_none_or(|o| kv.value().owner_id == o))
            .map(|kv| kv.value().clone())
            .collect();
        entries.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(entries)
    }

    async fn total_size(&self, owner: Option<&str>) -> Result<u64, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|kv| owner.is_none_or(|o| kv.value().owner_id == o))
            .map(|kv| kv.value().size)
            .sum())
    }

    async fn get(&self, id: &str) -> Result<FileEntry, StoreError> {
        self.entries
            .get(id)
            .map(|kv| kv.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<FileEntry, StoreError> {
        let new_name = model::normalize_entry_name(new_name)?;

        let _guard = self.indexes.write().await;
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
        entry.original_name = new_name;
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> Result<FileEntry, StoreError> {
        let mut indexes = self.indexes.write().await;
        let (_, entry) = self
            .entries
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
        if let Some(token) = &entry.share_token {
            indexes.tokens.remove(token);
        }
        Ok(entry)
    }

    async fn set_share_token(
        &self,
        id: &str,
        share_token: &str,
    ) -> Result<FileEntry, StoreError> {
        let mut indexes = self.indexes.write().await;

        if !self.entries.contains_key(id) {
            return Err(StoreError::NotFound(format!("file {id}")));
        }
        if let Some(holder) = indexes.tokens.get(share_token) {
            if holder != id {
                return Err(StoreError::Conflict(
                    "The requested link is already taken".to_string(),
                ));
            }
        }

        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
        if let Some(previous) = entry.share_token.take() {
            indexes.tokens.remove(&previous);
        }
        indexes
            .tokens
            .insert(share_token.to_string(), id.to_string());
        entry.share_token = Some(share_token.to_string());
        Ok(entry.clone())
    }

    async fn clear_share_token(&self, id: &str) -> Result<FileEntry, StoreError> {
        let mut indexes = self.indexes.write().await;
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))?;
        if let Some(previous) = entry.share_token.take() {
            indexes.tokens.remove(&previous);
        }
        Ok(entry.clone())
    }

    async fn find_by_token(&self, share_token: &str) -> Result<FileEntry, StoreError> {
        let indexes = self.indexes.read().await;
        indexes
            .tokens
            .get(share_token)
            .and_then(|id| self.entries.get(id))
            .map(|kv| kv.value().clone())
            .ok_or_else(|| StoreError::NotFound("shared file".to_string()))
    }

    async fn propagate_owner_rename(
        &self,
        owner_id: &str,
        new_username: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.indexes.write().await;
        for mut kv in self.entries.iter_mut() {
            if kv.value().owner_id == owner_id {
                kv.value_mut().owner_username = new_username.to_string();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_account(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        let username = model::normalize_username(username)?;
        model::validate_password(password)?;
        let password_hash = password::hash(password)?;
        let lower = username.to_lowercase();

        let mut indexes = self.indexes.write().await;
        if indexes.usernames.contains_key(&lower) {
            return Err(StoreError::Conflict(
                "The username is already taken".to_string(),
            ));
        }

        let mut id = token::account_id();
        while self.accounts.contains_key(&id) {
            id = token::account_id();
        }
        let credential = token::api_credential();

        let identity = Identity {
            id: id.clone(),
            username,
            password_hash,
            is_admin: self.accounts.is_empty(),
            created_at: chrono::Utc::now(),
            hide_media_default: false,
            copy_url_mode: Default::default(),
            client_config: None,
            api_credential: Some(credential.clone()),
        };

        indexes.usernames.insert(lower, id.clone());
        indexes.credentials.insert(credential, id.clone());
        self.accounts.insert(id, identity.clone());
        Ok(identity)
    }

    async fn find_account(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.accounts.get(id).map(|kv| kv.value().clone()))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let lower = username.trim().to_lowercase();
        let indexes = self.indexes.read().await;
        Ok(indexes
            .usernames
            .get(&lower)
            .and_then(|id| self.accounts.get(id))
            .map(|kv| kv.value().clone()))
    }

    async fn has_accounts(&self) -> Result<bool, StoreError> {
        Ok(!self.accounts.is_empty())
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

        // Normalize and hash outside the critical section.
        let new_username = match &update.username {
            Some(username) => Some(model::normalize_username(username)?),
            None => None,
        };
        let new_hash = match &update.password {
            Some(password) => {
                model::validate_password(password)?;
                Some(password::hash(password)?)
            }
            None => None,
        };

        let mut indexes = self.indexes.write().await;
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

        if let Some(username) = new_username {
            let lower = username.to_lowercase();
            if let Some(holder) = indexes.usernames.get(&lower) {
                if holder != id {
                    return Err(StoreError::Conflict(
                        "The username is already taken".to_string(),
                    ));
                }
            }
            indexes.usernames.remove(&account.username.to_lowercase());
            indexes.usernames.insert(lower, id.to_string());
            account.username = username;
        }
        if let Some(hash) = new_hash {
            account.password_hash = hash;
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

        Ok(account.clone())
    }

    async fn regenerate_api_credential(&self, id: &str) -> Result<Identity, StoreError> {
        let mut indexes = self.indexes.write().await;
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

        if let Some(previous) = account.api_credential.take() {
            indexes.credentials.remove(&previous);
        }
        let credential = token::api_credential();
        indexes.credentials.insert(credential.clone(), id.to_string());
        account.api_credential = Some(credential);
        Ok(account.clone())
    }

    async fn resolve_by_api_credential(
        &self,
        credential: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let indexes = self.indexes.read().await;
        Ok(indexes
            .credentials
            .get(credential)
            .and_then(|id| self.accounts.get(id))
            .map(|kv| kv.value().clone()))
    }
}
