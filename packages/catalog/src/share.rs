use tracing::warn;

use crate::error::StoreError;
use crate::model::FileEntry;
use crate::store::Catalog;
use crate::token;

/// Random tokens tried before giving up.
const MAX_TOKEN_ATTEMPTS: u32 = 5;

const SLUG_MIN: usize = 4;
const SLUG_MAX: usize = 64;

/// Make sure the entry carries a share token, minting a random one when
/// none is set. Idempotent: an existing token is returned untouched.
pub async fn ensure_token(
    catalog: &dyn Catalog,
    id: &str,
) -> Result<FileEntry, StoreError> {
    let entry = catalog.get(id).await?;
    if entry.share_token.is_some() {
        return Ok(entry);
    }

    for attempt in 1..=MAX_TOKEN_ATTEMPTS {
        match catalog.set_share_token(id, &token::share_token()).await {
            Err(e) if e.is_conflict() => {
                warn!(id, attempt, "Share token collision, retrying");
            }
            other => return other,
        }
    }

    Err(StoreError::TokenSpaceExhausted(MAX_TOKEN_ATTEMPTS))
}

/// Bind a caller-chosen slug. Exactly one attempt; a slug held by another
/// entry surfaces as `Conflict`.
pub async fn set_custom_token(
    catalog: &dyn Catalog,
    id: &str,
    slug: &str,
) -> Result<FileEntry, StoreError> {
    validate_slug(slug)?;
    catalog.set_share_token(id, slug).await
}

/// Remove the share binding. The value becomes free for later reuse.
pub async fn revoke_token(
    catalog: &dyn Catalog,
    id: &str,
) -> Result<FileEntry, StoreError> {
    catalog.clear_share_token(id).await
}

/// Slugs are 4-64 characters of letters, digits, '-' and '_'.
pub fn validate_slug(slug: &str) -> Result<(), StoreError> {
    let length_ok = (SLUG_MIN..=SLUG_MAX).contains(&slug.len());
    let charset_ok = slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !length_ok || !charset_ok {
        return Err(StoreError::Validation(
            "Custom links may only contain letters, digits, '-' and '_' \
             and must be 4-64 characters long"
                .into(),
        ));
    }
    Ok(())
}
