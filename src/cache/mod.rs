//! Response caching with pluggable backends.
//!
//! Detail lookups against the catalog API are the main source of rate
//! limiting, so resolved records are cached for a while. A cache problem must
//! never fail the screen: [`JsonCache`] logs and carries on, returning a miss
//! on read failure and dropping the value on write failure.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheBackend`] | Trait for byte-oriented cache backends |
//! | [`MemoryCache`] | In-memory LRU cache with TTL |
//! | [`NullCache`] | No-op cache for disabling caching |
//! | [`JsonCache`] | Typed JSON wrapper over a backend |

mod backend;

pub use backend::{CacheBackend, MemoryCache, NullCache};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// JSON view over a [`CacheBackend`] that swallows errors.
#[derive(Clone)]
pub struct JsonCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl JsonCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn memory(max_entries: usize, ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new(max_entries)), ttl)
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NullCache::new()), Duration::ZERO)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "error reading cache");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                if let Err(e) = self.backend.delete(key).await {
                    warn!(key, error = %e, "error evicting cache entry");
                }
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "error encoding cache entry");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &bytes, self.ttl).await {
            warn!(key, error = %e, "error writing cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u64,
        title: String,
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let cache = JsonCache::memory(8, Duration::from_secs(60));
        let entry = Entry {
            id: 21,
            title: "One Piece".into(),
        };
        cache.set("anime:21", &entry).await;
        assert_eq!(cache.get::<Entry>("anime:21").await, Some(entry));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let backend = Arc::new(MemoryCache::new(8));
        backend
            .set("anime:1", b"not json", Duration::from_secs(60))
            .await
            .unwrap();
        let cache = JsonCache::new(backend.clone(), Duration::from_secs(60));
        assert_eq!(cache.get::<Entry>("anime:1").await, None);
        assert_eq!(backend.len().await.unwrap(), 0);
    }

    /// Serves garbage and refuses to delete it.
    struct StuckCache;

    #[async_trait::async_trait]
    impl CacheBackend for StuckCache {
        async fn get(&self, _key: &str) -> crate::Result<Option<Vec<u8>>> {
            Ok(Some(b"{truncated".to_vec()))
        }
        async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> crate::Result<()> {
            Ok(())
        }
        async fn delete(&self, _key: &str) -> crate::Result<bool> {
            Err(crate::Error::runtime(
                "cache store is read-only",
                crate::ErrorContext::new(),
            ))
        }
        async fn clear(&self) -> crate::Result<()> {
            Ok(())
        }
        async fn len(&self) -> crate::Result<usize> {
            Ok(1)
        }
        fn name(&self) -> &'static str {
            "stuck"
        }
    }

    #[tokio::test]
    async fn test_failed_eviction_is_still_a_miss() {
        let cache = JsonCache::new(Arc::new(StuckCache), Duration::from_secs(60));
        assert_eq!(cache.get::<Entry>("anime:1").await, None);
        assert_eq!(cache.get::<Entry>("anime:1").await, None);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = JsonCache::disabled();
        cache.set("k", &1u32).await;
        assert_eq!(cache.get::<u32>("k").await, None);
        assert_eq!(cache.backend_name(), "null");
    }
}
