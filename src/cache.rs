//! Bounded in-memory distance cache.
//!
//! Distances are only valid relative to the origin they were computed from,
//! so the owner clears the whole cache when the user's location moves.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::key::CacheKey;

/// Default entry cap.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of distance entries before LRU eviction.
    pub capacity: NonZeroUsize,
    /// Entries older than this are treated as misses.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ttl: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub distance_km: f64,
    pub inserted_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    failures: LruCache<CacheKey, Instant>,
}

/// Thread-safe key to distance store shared by every resolver of a session.
pub struct DistanceCache {
    inner: Mutex<Inner>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl DistanceCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(config.capacity),
                failures: LruCache::new(config.capacity),
            }),
            ttl: config.ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::new(CacheConfig {
            capacity,
            ..CacheConfig::default()
        })
    }

    // A panic while holding the lock cannot leave the LRU half-updated in a
    // way that matters here, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached distance in kilometers, or `None` on a miss.
    pub fn get(&self, key: &CacheKey) -> Option<f64> {
        let mut inner = self.lock();
        let found = match inner.entries.get(key).copied() {
            Some(entry) if self.is_expired(&entry) => {
                inner.entries.pop(key);
                None
            }
            Some(entry) => Some(entry.distance_km),
            None => None,
        };
        drop(inner);

        match found {
            Some(distance_km) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%key, distance_km, "distance cache hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%key, "distance cache miss");
            }
        }
        found
    }

    /// Inserts or overwrites a distance. Non-finite or negative values are dropped.
    pub fn set(&self, key: CacheKey, distance_km: f64) {
        if !distance_km.is_finite() || distance_km < 0.0 {
            tracing::warn!(%key, distance_km, "refusing to cache unusable distance");
            return;
        }

        let mut inner = self.lock();
        inner.failures.pop(&key);
        inner.entries.put(
            key,
            CacheEntry {
                distance_km,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Empties the cache, failure memo included.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.failures.clear();
        drop(inner);
        tracing::info!(dropped, "distance cache cleared");
    }

    /// Remembers that resolving `key` just failed.
    pub fn record_failure(&self, key: CacheKey) {
        self.lock().failures.put(key, Instant::now());
    }

    /// Whether `key` failed less than `ttl` ago.
    pub fn recent_failure(&self, key: &CacheKey, ttl: Duration) -> bool {
        let mut inner = self.lock();
        match inner.failures.get(key).copied() {
            Some(failed_at) if failed_at.elapsed() < ttl => true,
            Some(_) => {
                inner.failures.pop(key);
                false
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits(),
            misses: self.misses(),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}
