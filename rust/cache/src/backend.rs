use std::time::Duration;

use async_trait::async_trait;

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;
pub type BackendResult<T> = Result<T, BackendError>;

/// Storage seam behind [`crate::Cache`]. Implementations store raw
/// bytes; (de)serialization lives in the facade.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BackendResult<()>;
    async fn delete(&self, key: &str) -> BackendResult<bool>;
    async fn exists(&self, key: &str) -> BackendResult<bool>;
    /// All live (non-expired) keys starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>>;
}
