//! A namespaced, TTL-bearing cache facade (§4.6).
//!
//! Keys are namespaced as `<prefix>:<namespace>:<identifier>`. Each
//! [`Namespace`] carries its own default TTL. [`Cache`] prefers a
//! Redis-backed [`RedisBackend`] when a connection URL is supplied and
//! reachable at construction time; otherwise, and whenever the Redis
//! connection drops, it falls back to an in-process [`MemoryBackend`].
//! A missing or unreachable backend never surfaces as an application
//! error — callers just see a miss.

mod backend;
mod memory;
mod redis_backend;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::CacheBackend;
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;

/// The five namespaces this system caches, each with its own default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Resolved `CitationRecord`s, keyed by canonical DOI. 24h.
    Citation,
    /// CrossRef/bibliographic search result pages, keyed by `query:limit`. 1h.
    CrossrefSearch,
    /// Cached workflow status snapshots, keyed by document id. 5m.
    WorkflowStatus,
    /// LLM Gateway responses, keyed by a hash of the rendered prompt. 2h.
    LlmResponse,
    /// Readability analyzer outputs, keyed by a hash of the input text. 1h.
    Readability,
}

impl Namespace {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citation => "citation",
            Self::CrossrefSearch => "crossref_search",
            Self::WorkflowStatus => "workflow_status",
            Self::LlmResponse => "llm_response",
            Self::Readability => "readability",
        }
    }

    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Citation => Duration::from_secs(24 * 60 * 60),
            Self::CrossrefSearch => Duration::from_secs(60 * 60),
            Self::WorkflowStatus => Duration::from_secs(5 * 60),
            Self::LlmResponse => Duration::from_secs(2 * 60 * 60),
            Self::Readability => Duration::from_secs(60 * 60),
        }
    }
}

/// The namespaced cache facade used by every collaborator that needs
/// to avoid repeating external lookups or generations.
#[derive(Clone)]
pub struct Cache {
    prefix: String,
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    /// Connect to Redis at `redis_url` if given and reachable; fall
    /// back to an in-process map otherwise. Never fails: a bad or
    /// absent URL just means the cache runs without a shared backend.
    pub async fn connect(prefix: impl Into<String>, redis_url: Option<&str>) -> Self {
        let prefix = prefix.into();

        if let Some(url) = redis_url {
            match RedisBackend::connect(url).await {
                Ok(backend) => {
                    tracing::info!("cache connected to redis");
                    return Self {
                        prefix,
                        backend: Arc::new(backend),
                    };
                }
                Err(error) => {
                    tracing::warn!(%error, "redis unreachable, falling back to in-process cache");
                }
            }
        }

        Self {
            prefix,
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    /// Build a cache backed only by the in-process map. Used in tests
    /// and whenever no cache URL is configured.
    #[must_use]
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    fn key(&self, namespace: Namespace, identifier: &str) -> String {
        format!("{}:{}:{}", self.prefix, namespace.as_str(), identifier)
    }

    /// Fetch and deserialize a cached value. Any backend error, or a
    /// value that no longer deserializes, is treated as a miss.
    pub async fn get<T: DeserializeOwned>(&self, namespace: Namespace, identifier: &str) -> Option<T> {
        let key = self.key(namespace, identifier);
        match self.backend.get(&key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(%error, %key, "cache get failed, treating as miss");
                None
            }
        }
    }

    /// Serialize and store `value` under the namespace's default TTL.
    pub async fn set<T: Serialize + Sync>(&self, namespace: Namespace, identifier: &str, value: &T) {
        self.set_with_ttl(namespace, identifier, value, namespace.default_ttl())
            .await;
    }

    /// Like [`Cache::set`] but with an explicit TTL override.
    pub async fn set_with_ttl<T: Serialize + Sync>(
        &self,
        namespace: Namespace,
        identifier: &str,
        value: &T,
        ttl: Duration,
    ) {
        let key = self.key(namespace, identifier);
        let Ok(bytes) = serde_json::to_vec(value) else {
            tracing::warn!(%key, "failed to serialize value for cache, skipping write");
            return;
        };
        if let Err(error) = self.backend.set(&key, bytes, ttl).await {
            tracing::warn!(%error, %key, "cache set failed");
        }
    }

    pub async fn delete(&self, namespace: Namespace, identifier: &str) -> bool {
        let key = self.key(namespace, identifier);
        self.backend.delete(&key).await.unwrap_or_else(|error| {
            tracing::warn!(%error, %key, "cache delete failed");
            false
        })
    }

    pub async fn exists(&self, namespace: Namespace, identifier: &str) -> bool {
        let key = self.key(namespace, identifier);
        self.backend.exists(&key).await.unwrap_or_else(|error| {
            tracing::warn!(%error, %key, "cache exists check failed");
            false
        })
    }

    /// Clear every cached entry (across all namespaces) whose key
    /// contains `user_id`. Matches the source's loose `*user_id*`
    /// scan rather than a strict key prefix, since not every
    /// namespace keys its entries by user.
    pub async fn clear_user(&self, user_id: &str) -> usize {
        let scan_prefix = format!("{}:", self.prefix);
        let keys = match self.backend.scan_prefix(&scan_prefix).await {
            Ok(keys) => keys,
            Err(error) => {
                tracing::warn!(%error, "cache scan failed during clear_user");
                return 0;
            }
        };

        let mut cleared = 0;
        for key in keys.into_iter().filter(|k| k.contains(user_id)) {
            if self.backend.delete(&key).await.unwrap_or(false) {
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    #[tokio::test]
    async fn round_trips_through_memory_backend() {
        let cache = Cache::in_memory("test");
        cache
            .set(Namespace::Citation, "10.1000/abc", &Payload { value: 42 })
            .await;

        let got: Option<Payload> = cache.get(Namespace::Citation, "10.1000/abc").await;
        assert_eq!(got, Some(Payload { value: 42 }));
        assert!(cache.exists(Namespace::Citation, "10.1000/abc").await);
    }

    #[tokio::test]
    async fn missing_key_is_a_miss_not_an_error() {
        let cache = Cache::in_memory("test");
        let got: Option<Payload> = cache.get(Namespace::Citation, "nonexistent").await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn delete_then_get_is_a_miss() {
        let cache = Cache::in_memory("test");
        cache
            .set(Namespace::Readability, "hash1", &Payload { value: 1 })
            .await;
        assert!(cache.delete(Namespace::Readability, "hash1").await);
        let got: Option<Payload> = cache.get(Namespace::Readability, "hash1").await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn clear_user_scopes_to_matching_keys() {
        let cache = Cache::in_memory("test");
        cache
            .set(Namespace::WorkflowStatus, "doc-user42-a", &Payload { value: 1 })
            .await;
        cache
            .set(Namespace::WorkflowStatus, "doc-user42-b", &Payload { value: 2 })
            .await;
        cache
            .set(Namespace::WorkflowStatus, "doc-other", &Payload { value: 3 })
            .await;

        let cleared = cache.clear_user("user42").await;
        assert_eq!(cleared, 2);
        assert!(!cache.exists(Namespace::WorkflowStatus, "doc-user42-a").await);
        assert!(cache.exists(Namespace::WorkflowStatus, "doc-other").await);
    }
}
