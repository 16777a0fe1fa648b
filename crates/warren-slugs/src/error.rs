use thiserror::Error;
use warren_core::{CompositeKey, StorageError};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, Error)]
pub enum SlugError {
    #[error("cannot encode slug: {0}")]
    Encoding(String),
    #[error("slug is malformed: {0}")]
    Decode(String),
    #[error("slug is corrupted: expected 2 numbers, decoded {count}")]
    Corrupted { count: usize },
}

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("no url stored under key {0}")]
    NotFound(CompositeKey),
    #[error("cannot save url under key {key}: {source}")]
    Write {
        key: CompositeKey,
        #[source]
        source: StorageError,
    },
    #[error("cannot load url under key {key}: {source}")]
    Read {
        key: CompositeKey,
        #[source]
        source: StorageError,
    },
    #[error("cannot obtain an instance index: {0}")]
    InstanceIndex(#[source] StorageError),
    #[error("instance index must be non-negative, got {0}")]
    NegativeInstanceIndex(i64),
}

impl RegistryError {
    /// Returns `true` if the error was caused by an invalid or tampered slug.
    pub fn is_invalid_slug(&self) -> bool {
        matches!(
            self,
            RegistryError::Slug(SlugError::Decode(_) | SlugError::Corrupted { .. })
        )
    }
}
