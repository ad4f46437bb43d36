use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::backend::{BackendResult, CacheBackend};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// The in-process fallback backend: a `RwLock`-protected map with
/// lazy expiry (checked on read, swept opportunistically on write).
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| "memory cache lock poisoned")?;
        Ok(entries.get(key).filter(|e| e.expires_at > Instant::now()).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BackendResult<()> {
        let mut entries = self.entries.write().map_err(|_| "memory cache lock poisoned")?;
        entries.retain(|_, e| e.expires_at > Instant::now());
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<bool> {
        let mut entries = self.entries.write().map_err(|_| "memory cache lock poisoned")?;
        Ok(entries.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        let entries = self.entries.read().map_err(|_| "memory cache lock poisoned")?;
        Ok(entries.get(key).is_some_and(|e| e.expires_at > Instant::now()))
    }

    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| "memory cache lock poisoned")?;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(k, e)| e.expires_at > now && k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entries_read_as_miss() {
        let backend = MemoryBackend::new();
        backend
            .set("k", b"v".to_vec(), Duration::from_millis(1))
            .await
            .expect("set");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.get("k").await.expect("get"), None);
        assert!(!backend.exists("k").await.expect("exists"));
    }
}
