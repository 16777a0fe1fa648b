use crate::error::Result;
use crate::key::CompositeKey;
use async_trait::async_trait;
use std::sync::Arc;

/// Key/value persistence for URL records.
///
/// Implementations must not partially apply a `save`: it either stores the
/// whole value or fails. Retry, backoff and timeout policy belong to the
/// implementation, not to its callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Stores `value` under `key`, replacing any previous value.
    async fn save(&self, key: &CompositeKey, value: &str) -> Result<()>;

    /// Loads the value stored under `key`.
    ///
    /// Returns `Err(StorageError::NotFound)` if nothing is stored there.
    async fn load(&self, key: &CompositeKey) -> Result<String>;
}

/// The fleet-wide atomic counter handing out instance indices.
#[async_trait]
pub trait InstanceIndexSource: Send + Sync + 'static {
    /// Returns a value no other caller has received from this source.
    ///
    /// Must fail rather than return a duplicate when the backing store is
    /// unreachable.
    async fn next_instance_index(&self) -> Result<i64>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn save(&self, key: &CompositeKey, value: &str) -> Result<()> {
        (**self).save(key, value).await
    }

    async fn load(&self, key: &CompositeKey) -> Result<String> {
        (**self).load(key).await
    }
}

#[async_trait]
impl<T: InstanceIndexSource + ?Sized> InstanceIndexSource for Arc<T> {
    async fn next_instance_index(&self) -> Result<i64> {
        (**self).next_instance_index().await
    }
}
