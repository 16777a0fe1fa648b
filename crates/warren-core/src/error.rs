use thiserror::Error;

/// Result type for key/value store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("key part must be non-negative, got {0}")]
    NegativeKeyPart(i64),
    #[error("invalid composite key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("no value stored under key {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Returns `true` if the error signals a missing key rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
