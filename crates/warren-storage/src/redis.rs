use ::redis::aio::MultiplexedConnection;
use ::redis::{AsyncCommands, RedisError};
use async_trait::async_trait;
use tracing::{debug, trace, warn};
use warren_core::error::{Result, StorageError};
use warren_core::{CompositeKey, InstanceIndexSource, KeyValueStore};

/// Default name of the fleet-wide instance counter.
pub const DEFAULT_INSTANCE_INDEX_KEY: &str = "instance_index";

/// A Redis-backed implementation of the store contracts.
///
/// URLs are plain string values under `{key_prefix}{instance}:{sequence}`.
/// The instance counter lives under `{key_prefix}{instance_index_key}` and
/// is advanced with `INCR`, which Redis applies atomically for every client.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    instance_index_key: String,
}

fn map_redis_error(operation: &str, err: RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        StorageError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

impl RedisStore {
    /// Creates a store on top of an established connection.
    ///
    /// Keys are unprefixed and the instance counter lives under
    /// [`DEFAULT_INSTANCE_INDEX_KEY`] until configured otherwise.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection, cloned per operation
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: String::new(),
            instance_index_key: DEFAULT_INSTANCE_INDEX_KEY.to_string(),
        }
    }

    /// Opens a multiplexed connection to `redis_url` and wraps it.
    ///
    /// Fails with [`StorageError::Unavailable`] if the URL is malformed or
    /// the server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = ::redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid Redis connection info", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        debug!("connected to Redis");
        Ok(Self::new(conn))
    }

    /// Prepends `key_prefix` to every key this store touches.
    ///
    /// # Arguments
    ///
    /// * `key_prefix` - Namespace for URL keys and the instance counter,
    ///   e.g. `"warren:"`
    pub fn with_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Uses `key` as the name of the instance counter.
    pub fn with_instance_index_key(mut self, key: impl Into<String>) -> Self {
        self.instance_index_key = key.into();
        self
    }

    fn value_key(&self, key: &CompositeKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn counter_key(&self) -> String {
        format!("{}{}", self.key_prefix, self.instance_index_key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn save(&self, key: &CompositeKey, value: &str) -> Result<()> {
        let redis_key = self.value_key(key);
        trace!(key = %redis_key, "Writing value to Redis");

        let mut conn = self.conn.clone();
        match conn.set::<_, _, ()>(&redis_key, value).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(key = %redis_key, error = %e, "Redis error on set");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn load(&self, key: &CompositeKey) -> Result<String> {
        let redis_key = self.value_key(key);
        trace!(key = %redis_key, "Reading value from Redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                trace!(key = %redis_key, "No value in Redis");
                Err(StorageError::NotFound(redis_key))
            }
            Err(e) => {
                warn!(key = %redis_key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }
}

#[async_trait]
impl InstanceIndexSource for RedisStore {
    async fn next_instance_index(&self) -> Result<i64> {
        let counter_key = self.counter_key();

        let mut conn = self.conn.clone();
        match conn.incr::<_, _, i64>(&counter_key, 1).await {
            Ok(index) => {
                debug!(key = %counter_key, index, "Incremented instance counter");
                Ok(index)
            }
            Err(e) => {
                warn!(key = %counter_key, error = %e, "Redis error on incr");
                Err(map_redis_error("failed to increment instance counter", e))
            }
        }
    }
}
