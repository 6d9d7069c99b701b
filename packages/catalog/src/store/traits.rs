use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{AccountUpdate, FileEntry, Identity, NewFileEntry};
use crate::password;

/// The file catalog: metadata rows for uploaded files and their share
/// bindings. Mutations on a single entry are serialized by every backend;
/// a failed operation leaves no partial state.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Persist a new entry, assigning id, stored name and upload timestamp.
    async fn create(&self, new: NewFileEntry, owner: &Identity)
    -> Result<FileEntry, StoreError>;

    /// Entries newest-upload-first. `owner` scopes the listing to one
    /// account; `None` lists everything.
    async fn list(&self, owner: Option<&str>) -> Result<Vec<FileEntry>, StoreError>;

    /// Sum of entry sizes in bytes, optionally scoped to one owner.
    async fn total_size(&self, owner: Option<&str>) -> Result<u64, StoreError>;

    /// Look up one entry by id.
    async fn get(&self, id: &str) -> Result<FileEntry, StoreError>;

    /// Change the display name. The stored name never changes.
    async fn rename(&self, id: &str, new_name: &str) -> Result<FileEntry, StoreError>;

    /// Remove the entry together with its share binding, returning the
    /// removed row so callers can clean up the blob.
    async fn delete(&self, id: &str) -> Result<FileEntry, StoreError>;

    /// Bind `token` to the entry. Fails with `Conflict` if another entry
    /// holds the token; the uniqueness check and the write are one atomic
    /// step. Rebinding an entry's own current token succeeds.
    async fn set_share_token(&self, id: &str, token: &str)
    -> Result<FileEntry, StoreError>;

    /// Drop the share binding. Succeeds even when none was set.
    async fn clear_share_token(&self, id: &str) -> Result<FileEntry, StoreError>;

    /// Resolve a public share token to its entry.
    async fn find_by_token(&self, token: &str) -> Result<FileEntry, StoreError>;

    /// Rewrite the denormalized owner username on every entry of one owner.
    async fn propagate_owner_rename(
        &self,
        owner_id: &str,
        new_username: &str,
    ) -> Result<(), StoreError>;
}

/// Account storage and credential resolution.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an account. Usernames are unique case-insensitively; the
    /// first account in an empty store becomes the administrator. A fresh
    /// API credential is issued.
    async fn create_account(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, StoreError>;

    async fn find_account(&self, id: &str) -> Result<Option<Identity>, StoreError>;

    /// Case-insensitive username lookup.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<Identity>, StoreError>;

    async fn has_accounts(&self) -> Result<bool, StoreError>;

    /// Apply a partial update. An empty update returns the current row
    /// without writing. Callers are responsible for propagating a username
    /// change into the catalog's denormalized copies.
    async fn update_account(
        &self,
        id: &str,
        update: AccountUpdate,
    ) -> Result<Identity, StoreError>;

    /// Replace the long-lived API credential, invalidating the old value.
    async fn regenerate_api_credential(&self, id: &str) -> Result<Identity, StoreError>;

    /// Resolve a long-lived API credential to its account.
    async fn resolve_by_api_credential(
        &self,
        credential: &str,
    ) -> Result<Option<Identity>, StoreError>;

    /// Verify a username/password pair. Unknown usernames and wrong
    /// passwords are indistinguishable to the caller.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let Some(identity) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        if password::verify(password, &identity.password_hash) {
            Ok(Some(identity))
        } else {
            Ok(None)
        }
    }
}

/// A complete persistence backend: catalog plus identity store behind one
/// object.
pub trait Store: Catalog + IdentityStore {}

impl<T: Catalog + IdentityStore> Store for T {}
