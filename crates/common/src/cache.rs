//! Key/value cache stores for rendered fragments.
//!
//! Two backends implement [`CacheStore`]:
//!
//! - [`MemoryCacheStore`]: process-local map, empty at process start
//! - [`RedisCacheStore`]: shared Redis instance, for multi-process deployments
//!
//! Neither backend observes writes to the database. Entries disappear only
//! when their TTL runs out or when [`CacheStore::delete`] is called.

use crate::{AppError, AppResult};
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Most entries a [`MemoryCacheStore`] holds before evicting.
pub const MEMORY_STORE_CAPACITY: usize = 1000;

/// Cache store capability.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a cached value. Expired entries read as `None`.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a value for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache store.
///
/// Holds at most `capacity` entries. Past that, expired entries are
/// dropped first, then the ones closest to expiry.
#[derive(Clone)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    capacity: usize,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_capacity(MEMORY_STORE_CAPACITY)
    }
}

impl MemoryCacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store bounded to `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );

        if entries.len() > self.capacity {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        if entries.len() > self.capacity {
            let mut by_expiry: Vec<(Instant, String)> = entries
                .iter()
                .map(|(key, entry)| (entry.expires_at, key.clone()))
                .collect();
            by_expiry.sort_unstable();
            let excess = entries.len() - self.capacity;
            for (_, key) in by_expiry.into_iter().take(excess) {
                entries.remove(&key);
            }
            debug!(evicted = excess, "Memory cache over capacity");
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Redis-backed cache store.
#[derive(Clone)]
pub struct RedisCacheStore {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisCacheStore {
    /// Create a new Redis cache store. Every key is namespaced by `prefix`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value: Option<String> = self
            .redis
            .get(self.full_key(key))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        debug!(key = %key, hit = value.is_some(), "Redis cache lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let secs = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);
        self.redis
            .set::<(), _, _>(
                self.full_key(key),
                value,
                Some(Expiration::EX(secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.redis
            .del::<i64, _>(self.full_key(key))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_delete() {
        let store = MemoryCacheStore::new();
        assert!(store.is_empty().await);

        store
            .set("fragment", "<ul></ul>", Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(
            store.get("fragment").await.unwrap().as_deref(),
            Some("<ul></ul>")
        );

        store.delete("fragment").await.unwrap();
        assert!(store.get("fragment").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_delete_missing_key() {
        let store = MemoryCacheStore::new();
        assert!(store.delete("missing").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_entry_expires() {
        let store = MemoryCacheStore::new();
        store
            .set("fragment", "cached", Duration::from_secs(20))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(19)).await;
        assert!(store.get("fragment").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("fragment").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_evicts_past_capacity() {
        let store = MemoryCacheStore::with_capacity(3);
        store.set("long", "a", Duration::from_secs(60)).await.unwrap();
        store.set("short", "b", Duration::from_secs(5)).await.unwrap();
        store.set("mid", "c", Duration::from_secs(30)).await.unwrap();
        store.set("new", "d", Duration::from_secs(20)).await.unwrap();

        assert_eq!(store.len().await, 3);
        assert!(store.get("short").await.unwrap().is_none());
        assert!(store.get("long").await.unwrap().is_some());
        assert!(store.get("new").await.unwrap().is_some());

        for n in 0..50 {
            store
                .set(&format!("page.{n}"), "x", Duration::from_secs(20))
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_entries() {
        let store = MemoryCacheStore::new();
        let other = store.clone();
        store
            .set("fragment", "shared", Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(other.get("fragment").await.unwrap().as_deref(), Some("shared"));
        assert_eq!(other.len().await, 1);
    }
}
