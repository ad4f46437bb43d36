use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::backend::{BackendResult, CacheBackend};

/// Redis-backed cache storage. Uses a [`ConnectionManager`], which
/// reconnects transparently on transient network failures rather than
/// surfacing them to every caller.
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BackendResult<()> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<bool> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let pattern = format!("{prefix}*");
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}
