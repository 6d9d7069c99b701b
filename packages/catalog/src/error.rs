use thiserror::Error;

/// Failure classes shared by every persistence backend.
///
/// `NotFound`, `Conflict` and `Validation` describe rejected requests and
/// leave no partial state behind. The remaining variants are infrastructure
/// failures the caller cannot repair by changing its input.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Could not allocate a unique share token after {0} attempts")]
    TokenSpaceExhausted(u32),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True for a uniqueness rejection the caller may retry with a
    /// different value.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// True when retrying with different input cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TokenSpaceExhausted(_)
                | Self::Database(_)
                | Self::Serialization(_)
                | Self::Io(_)
                | Self::Internal(_)
        )
    }
}
