//! Redis-backed shared store.
//!
//! Uses a `ConnectionManager`, which reconnects transparently; a command issued
//! while the server is away fails and is surfaced as `StoreError::Unavailable`.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{StorageHandler, StoreError, StoreResult};

/// Shared store over a Redis server or proxy.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `redis://host:port/db`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(map_err)?;
        let conn = ConnectionManager::new(client).await.map_err(map_err)?;
        tracing::info!(backend = "redis", "Shared store connected");
        Ok(Self { conn })
    }
}

fn map_err(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
impl StorageHandler for RedisStore {
    async fn get_key(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_err)
    }

    async fn set_key(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        if ttl_secs == 0 {
            conn.set::<_, _, ()>(key, value).await.map_err(map_err)
        } else {
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await.map_err(map_err)
        }
    }

    async fn delete_key(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await.map_err(map_err)?;
        Ok(removed > 0)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
