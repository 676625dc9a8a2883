//! In-memory response cache with TTL expiry and tag-based invalidation.
//!
//! Entries are evicted in insertion order once the cache is full. This is a
//! FIFO approximation: reading an entry does not make it younger, and
//! overwriting a key keeps the slot it was first inserted in.

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::CacheConfig;

type CachedValue = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
    tags: HashSet<String>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in first-insertion order.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheInner {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&CacheEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(entry));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room for new ones.
    pub evictions: u64,
    /// Entries dropped because their TTL ran out.
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of lookups that were hits, in `[0, 1]`.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Tag-addressable TTL cache shared by reference.
///
/// Values of any `Send + Sync` type can be stored; [`get`](Self::get) returns
/// `None` when the stored value has a different type.
pub struct ResponseCache {
    max_size: usize,
    default_ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl ResponseCache {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            max_size,
            default_ttl,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size, config.ttl)
    }

    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, dropping it if it has expired.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let now = Instant::now();
        let mut inner = self.lock();

        match inner.entries.get(key).map(|e| e.is_expired(now)) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(true) => {
                inner.remove(key);
                inner.expirations += 1;
                inner.misses += 1;
                return None;
            }
            Some(false) => {}
        }

        let value = inner.entries.get(key).map(|e| Arc::clone(&e.value))?;
        match value.downcast::<T>() {
            Ok(v) => {
                inner.hits += 1;
                Some(v)
            }
            Err(_) => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`, labelled with `tags`.
    ///
    /// When the cache is full and `key` is new, the oldest inserted entry is
    /// evicted first.
    pub fn set<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: Arc<T>,
        ttl: Duration,
        tags: impl IntoIterator<Item = String>,
    ) {
        if self.max_size == 0 {
            return;
        }

        let key = key.into();
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
            tags: tags.into_iter().collect(),
        };

        let mut inner = self.lock();
        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while inner.entries.len() >= self.max_size {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if inner.entries.remove(&oldest).is_some() {
                inner.evictions += 1;
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, entry);
    }

    /// Store `value` with the cache's default TTL.
    pub fn set_default<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: Arc<T>,
        tags: impl IntoIterator<Item = String>,
    ) {
        self.set(key, value, self.default_ttl, tags);
    }

    /// Remove `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    /// Remove every entry carrying at least one of `tags`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let mut inner = self.lock();
        inner.remove_where(|entry| tags.iter().any(|t| entry.tags.contains(t.as_ref())))
    }

    /// Remove all entries. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let removed = inner.remove_where(|entry| entry.is_expired(now));
        inner.expirations += removed as u64;
        removed
    }

    #[must_use]
    pub fn get_stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            max_size: self.max_size,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
