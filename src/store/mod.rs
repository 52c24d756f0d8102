//! Shared key/value store used for leadership and host down-state.
//!
//! # Data Flow
//! ```text
//! HostCheckerManager
//!     → get_key / set_key / delete_key
//!     → memory.rs (single node, tests)
//!     → redis.rs  (cluster, feature "redis")
//! ```
//!
//! # Design Decisions
//! - Single-key operations only; no transactions and no compare-and-swap
//! - `get_key` separates "not found" (`Ok(None)`) from backend failure (`Err`)
//! - A TTL of zero stores the key without expiry

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Errors returned by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value storage with per-key expiry, shared across gateway nodes.
#[async_trait]
pub trait StorageHandler: Send + Sync {
    /// Read a key. `Ok(None)` when absent or expired.
    async fn get_key(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a key with an expiry in seconds (0 = no expiry).
    async fn set_key(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    /// Delete a key. Returns whether a live key was removed.
    async fn delete_key(&self, key: &str) -> StoreResult<bool>;

    fn backend_name(&self) -> &'static str;
}
