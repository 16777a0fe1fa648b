use async_trait::async_trait;
use tracing::{info_span, Instrument};
use warren_core::error::Result;
use warren_core::{CompositeKey, InstanceIndexSource, KeyValueStore};

/// Wraps a store and runs every call inside its own tracing span.
///
/// Spans are named after the operation (`save_value`, `load_value`,
/// `next_instance_index`) and carry the key as a field, so they show up as
/// children of the request span when OTLP export is enabled.
#[derive(Debug, Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for TracedStore<S> {
    async fn save(&self, key: &CompositeKey, value: &str) -> Result<()> {
        let span = info_span!("save_value", key = %key);
        self.inner.save(key, value).instrument(span).await
    }

    async fn load(&self, key: &CompositeKey) -> Result<String> {
        let span = info_span!("load_value", key = %key);
        self.inner.load(key).instrument(span).await
    }
}

#[async_trait]
impl<S: InstanceIndexSource> InstanceIndexSource for TracedStore<S> {
    async fn next_instance_index(&self) -> Result<i64> {
        self.inner
            .next_instance_index()
            .instrument(info_span!("next_instance_index"))
            .await
    }
}
