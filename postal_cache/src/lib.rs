//! Fixed-capacity cache of decoded series, keyed by label.
//!
//! Eviction is strictly by insertion order: a hit does not make an entry
//! younger. Fetching a series is the expensive part (network, decompression,
//! decode), so the cache is consulted before every fetch.
#![deny(missing_docs)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use postal_codec::Series;
use tracing::debug;

/// Default number of series kept.
pub const DEFAULT_CAPACITY: usize = 25;

/// Hit/miss/eviction counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to fetch.
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
}

/// FIFO cache of decoded series.
#[derive(Debug)]
pub struct SeriesCache {
    /// Maximum number of entries.
    capacity: usize,
    /// Labels in insertion order, oldest at the front.
    order: VecDeque<String>,
    /// Label to series.
    entries: HashMap<String, Arc<Series>>,
    stats: CacheStats,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SeriesCache {
    /// Create a cache holding at most `capacity` series. A capacity of zero
    /// disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached series for `label`, or run `fetch` and cache its result.
    ///
    /// A failed fetch leaves the cache exactly as it was.
    pub async fn get_or_fetch<F, Fut, E>(&mut self, label: &str, fetch: F) -> Result<Arc<Series>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Series, E>>,
    {
        if let Some(series) = self.entries.get(label) {
            self.stats.hits += 1;
            debug!(label, "cache hit");
            return Ok(Arc::clone(series));
        }

        self.stats.misses += 1;
        debug!(label, "cache miss");
        let series = Arc::new(fetch().await?);
        self.insert(label, Arc::clone(&series));
        Ok(series)
    }

    /// Insert `series` under `label`, evicting the oldest entry if full.
    /// Replacing an existing label keeps its original position.
    pub fn insert(&mut self, label: &str, series: Arc<Series>) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(label) {
            *slot = series;
            return;
        }
        self.ensure_capacity();
        self.order.push_back(label.to_string());
        self.entries.insert(label.to_string(), series);
    }

    /// Look up `label` without fetching. Counts as neither hit nor miss.
    pub fn get(&self, label: &str) -> Option<Arc<Series>> {
        self.entries.get(label).cloned()
    }

    /// Whether `label` is cached.
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "cache flushed");
        self.order.clear();
        self.entries.clear();
    }

    /// Number of cached series.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached labels, next to be evicted first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Counters since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn ensure_capacity(&mut self) {
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => self.evict(&oldest),
                None => break,
            }
        }
    }

    fn evict(&mut self, label: &str) {
        if self.entries.remove(label).is_some() {
            self.stats.evictions += 1;
            debug!(label, "cache eviction");
        }
    }
}
