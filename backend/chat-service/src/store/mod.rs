//! Durable store adapter.
//!
//! The chat core only needs four commands from its backing store: append to an
//! ordered log, read the whole log, add to a set, and read the set. Redis is the
//! production backend; the in-memory backend serves standalone runs and tests.

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection or readiness failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A single command was rejected or failed
    #[error("store command failed: {0}")]
    Command(String),
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Append one serialized entry; the newest entry is read first.
    async fn append_to_log(&self, log: &str, entry: String) -> StoreResult<()>;

    /// Read every entry of the log, most recent first.
    async fn read_log(&self, log: &str) -> StoreResult<Vec<String>>;

    /// Returns `true` when `member` was not in the set before.
    async fn add_to_set(&self, set: &str, member: &str) -> StoreResult<bool>;

    async fn read_set(&self, set: &str) -> StoreResult<Vec<String>>;

    /// Liveness probe.
    async fn ping(&self) -> StoreResult<()>;
}
