use crate::error::{RegistryError, Result, SlugError};
use crate::slugifier::Slugifier;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};
use warren_core::{CompositeKey, InstanceIndexSource, KeyValueStore, Slug, StorageError};

/// Registration and lookup of URLs, as consumed by the transport layer.
#[async_trait]
pub trait UrlRegistry: Send + Sync + 'static {
    /// Stores `url` and returns the slug it can be retrieved with.
    async fn register_url(&self, url: &str) -> Result<Slug>;

    /// Returns the URL a slug was registered for.
    async fn get_url(&self, slug: &str) -> Result<String>;
}

/// The per-instance slug registry.
///
/// Every registration reads the local sequence counter, encodes
/// `(instance_index, sequence)`, saves the URL under the matching
/// [`CompositeKey`] and only then advances the counter. That whole section
/// runs under one lock, so concurrent registrations never share a sequence
/// number. Lookups do not take the lock.
///
/// A failed or cancelled registration leaves the counter where it was: the
/// next call reuses the same sequence number, key and slug.
pub struct SlugRegistry<S, K> {
    slugifier: S,
    store: K,
    instance_index: i64,
    next_sequence: Mutex<i64>,
}

impl<S: Slugifier, K: KeyValueStore> SlugRegistry<S, K> {
    /// Creates a registry for an already assigned instance index.
    ///
    /// # Arguments
    ///
    /// * `slugifier` - Turns `(instance_index, sequence)` pairs into slugs
    /// * `store` - Where URLs are saved under their composite key
    /// * `instance_index` - This instance's index, unique across the fleet
    pub fn new(slugifier: S, store: K, instance_index: i64) -> Self {
        Self::with_next_sequence(slugifier, store, instance_index, 0)
    }

    /// Creates a registry whose counter starts at `next_sequence`.
    ///
    /// The caller guarantees that no key of `instance_index` at or above
    /// `next_sequence` has been written before.
    pub fn with_next_sequence(
        slugifier: S,
        store: K,
        instance_index: i64,
        next_sequence: i64,
    ) -> Self {
        Self {
            slugifier,
            store,
            instance_index,
            next_sequence: Mutex::new(next_sequence),
        }
    }

    /// Creates a registry, taking a fresh instance index from `source`.
    ///
    /// `source` is asked exactly once.
    pub async fn bootstrap<A>(slugifier: S, store: K, source: &A) -> Result<Self>
    where
        A: InstanceIndexSource + ?Sized,
    {
        let instance_index = source
            .next_instance_index()
            .await
            .map_err(RegistryError::InstanceIndex)?;

        if instance_index < 0 {
            return Err(RegistryError::NegativeInstanceIndex(instance_index));
        }

        info!(instance_index, "obtained the service instance index");
        Ok(Self::new(slugifier, store, instance_index))
    }

    /// The index every slug of this registry encodes.
    pub fn instance_index(&self) -> i64 {
        self.instance_index
    }

    /// The sequence number the next successful registration will use.
    pub async fn next_sequence(&self) -> i64 {
        *self.next_sequence.lock().await
    }

    /// Saves `url` under the next sequence number.
    ///
    /// The counter only advances once the save succeeded, so a failed or
    /// cancelled registration leaves no gap.
    pub async fn register_url(&self, url: &str) -> Result<Slug> {
        let mut next_sequence = self.next_sequence.lock().await;
        let sequence = *next_sequence;

        let slug = self.slugifier.encode(self.instance_index, sequence)?;
        trace!(slug = %slug, sequence, "the new slug has been produced");

        let key = CompositeKey::new(self.instance_index, sequence)
            .map_err(|e| SlugError::Encoding(e.to_string()))?;
        let following = sequence.checked_add(1).ok_or_else(|| {
            SlugError::Encoding(format!(
                "sequence space of instance {} is exhausted",
                self.instance_index
            ))
        })?;

        if let Err(source) = self.store.save(&key, url).await {
            error!(key = %key, url, error = %source, "cannot create a record");
            return Err(RegistryError::Write { key, source });
        }

        *next_sequence = following;
        Ok(slug)
    }

    pub async fn get_url(&self, slug: &str) -> Result<String> {
        let (instance_index, sequence) = self.slugifier.decode(slug)?;
        let key = CompositeKey::new(instance_index, sequence)
            .map_err(|e| SlugError::Decode(e.to_string()))?;

        match self.store.load(&key).await {
            Ok(url) => Ok(url),
            Err(StorageError::NotFound(_)) => {
                debug!(key = %key, slug, "no record for slug");
                Err(RegistryError::NotFound(key))
            }
            Err(source) => {
                error!(key = %key, error = %source, "cannot read a value");
                Err(RegistryError::Read { key, source })
            }
        }
    }
}

#[async_trait]
impl<S: Slugifier, K: KeyValueStore> UrlRegistry for SlugRegistry<S, K> {
    async fn register_url(&self, url: &str) -> Result<Slug> {
        SlugRegistry::register_url(self, url).await
    }

    async fn get_url(&self, slug: &str) -> Result<String> {
        SlugRegistry::get_url(self, slug).await
    }
}
