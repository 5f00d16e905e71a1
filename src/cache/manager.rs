//! Keyed TTL cache manager
//!
//! Provides a `CacheManager` that stores serializable data as JSON values with
//! the time they were written. Expired entries are kept, not evicted, so that a
//! failed refresh can fall back to them.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Clock, SystemClock};

/// Default time-to-live for cache entries, in milliseconds
pub const DEFAULT_TTL_MS: i64 = 60_000;

/// A single cached payload
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached data, JSON-encoded
    data: Value,
    /// When the data was cached
    cached_at: DateTime<Utc>,
}

/// Result of reading from cache, including metadata about cache freshness
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the entry is older than the TTL it was read with
    pub is_expired: bool,
}

/// Memoizes async fetches under string keys
///
/// Construct one at startup and share it by cloning; clones see the same
/// entries. There is no single-flight guard: two concurrent misses on the same
/// key both run their fetcher and the last write wins.
#[derive(Debug, Clone)]
pub struct CacheManager {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    /// Creates a cache on the system clock with the default 60 second TTL
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a cache driven by a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            default_ttl: Duration::milliseconds(DEFAULT_TTL_MS),
        }
    }

    /// Overrides the TTL used by `fetch_with_cache`
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// The TTL applied when a caller does not pass one
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes data to the cache, stamped with the current time
    ///
    /// Replaces any existing entry for `key` as a whole.
    pub fn write<T: Serialize>(&self, key: &str, data: &T) -> Result<(), serde_json::Error> {
        let entry = CacheEntry {
            data: serde_json::to_value(data)?,
            cached_at: self.clock.now(),
        };
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    /// Reads data from the cache
    ///
    /// Returns `None` if the entry doesn't exist or doesn't decode as `T`.
    /// Returns `Some(CachedData)` with `is_expired = true` if the entry is at
    /// least `ttl` old.
    pub fn read<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<CachedData<T>> {
        let entry = self.lock().get(key).cloned()?;
        let data = serde_json::from_value(entry.data).ok()?;

        let age = self.clock.now() - entry.cached_at;

        Some(CachedData {
            data,
            cached_at: entry.cached_at,
            is_expired: age >= ttl,
        })
    }

    /// Like `fetch_with_cache_ttl`, using the cache's default TTL
    pub async fn fetch_with_cache<T, E, F, Fut>(&self, key: &str, fetcher: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch_with_cache_ttl(key, self.default_ttl, fetcher)
            .await
    }

    /// Returns the cached value for `key`, fetching it when missing or expired
    ///
    /// # Behavior
    /// - A fresh entry is returned without invoking `fetcher`
    /// - Otherwise `fetcher` runs once; on success its value is stored and returned
    /// - If `fetcher` fails, an expired entry is returned when one exists
    /// - With no entry at all, the fetcher's error is returned
    pub async fn fetch_with_cache_ttl<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.read::<T>(key, ttl) {
            if !cached.is_expired {
                tracing::debug!(key, "cache hit");
                return Ok(cached.data);
            }
            tracing::debug!(key, cached_at = %cached.cached_at, "cache entry expired");
        } else {
            tracing::debug!(key, "cache miss");
        }

        match fetcher().await {
            Ok(data) => {
                if let Err(e) = self.write(key, &data) {
                    tracing::warn!(key, error = %e, "failed to encode value for cache");
                }
                Ok(data)
            }
            Err(err) => {
                if let Some(stale) = self.read::<T>(key, ttl) {
                    tracing::warn!(
                        key,
                        error = %err,
                        cached_at = %stale.cached_at,
                        "fetch failed, serving stale cache entry"
                    );
                    return Ok(stale.data);
                }
                Err(err)
            }
        }
    }

    /// Removes the entry for `key`, if any
    pub fn clear(&self, key: &str) {
        if self.lock().remove(key).is_some() {
            tracing::debug!(key, "cache entry cleared");
        }
    }

    /// Removes every entry
    pub fn clear_all(&self) {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        tracing::debug!(count, "cache cleared");
    }

    /// Number of entries currently held, fresh or expired
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
