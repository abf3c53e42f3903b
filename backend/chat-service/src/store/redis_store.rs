use super::{ChatStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use redis_utils::SharedConnectionManager;

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        if e.is_io_error()
            || e.is_connection_dropped()
            || e.is_connection_refusal()
            || e.is_timeout()
        {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

/// Redis-backed store: the log is a list (`LPUSH`/`LRANGE`), the users a set.
#[derive(Clone)]
pub struct RedisStore {
    manager: SharedConnectionManager,
}

impl RedisStore {
    pub fn new(manager: SharedConnectionManager) -> Self {
        Self { manager }
    }

    async fn conn(&self) -> ConnectionManager {
        self.manager.lock().await.clone()
    }
}

#[async_trait]
impl ChatStore for RedisStore {
    async fn append_to_log(&self, log: &str, entry: String) -> StoreResult<()> {
        let mut conn = self.conn().await;
        let _len: i64 = conn.lpush(log, entry).await?;
        Ok(())
    }

    async fn read_log(&self, log: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await;
        Ok(conn.lrange(log, 0, -1).await?)
    }

    async fn add_to_set(&self, set: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await;
        let added: i64 = conn.sadd(set, member).await?;
        Ok(added > 0)
    }

    async fn read_set(&self, set: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await;
        Ok(conn.smembers(set).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        redis_utils::ping(&self.manager)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{e:#}")))
    }
}
