use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use warren_core::error::{Result, StorageError};
use warren_core::{CompositeKey, InstanceIndexSource, KeyValueStore};

/// In-memory implementation of the store contracts using DashMap.
///
/// The instance index counter behaves like Redis `INCR` on a missing key:
/// the first call returns 1.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    storage: DashMap<String, String>,
    instance_counter: AtomicI64,
}

impl InMemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
            instance_counter: AtomicI64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns every stored key in ascending order.
    pub fn keys(&self) -> Vec<CompositeKey> {
        let mut keys: Vec<CompositeKey> = self
            .storage
            .iter()
            .filter_map(|entry| entry.key().parse().ok())
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn save(&self, key: &CompositeKey, value: &str) -> Result<()> {
        self.storage.insert(key.to_string(), value.to_owned());
        Ok(())
    }

    async fn load(&self, key: &CompositeKey) -> Result<String> {
        let key = key.to_string();
        match self.storage.get(&key) {
            Some(value) => Ok(value.clone()),
            None => Err(StorageError::NotFound(key)),
        }
    }
}

#[async_trait]
impl InstanceIndexSource for InMemoryStore {
    async fn next_instance_index(&self) -> Result<i64> {
        Ok(self.instance_counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
