use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use lru::LruCache;
use parking_lot::Mutex;
use crate::search::results::SearchResult;

/// LRU cache of search results, keyed by the serialised query and the
/// index write version it was computed at
pub struct QueryCache {
    cache: Option<Mutex<LruCache<QueryKey, SearchResult>>>,  // None: disabled
    pub size_limit: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub query: String,
    pub version: u64,
}

impl QueryCache {
    pub fn new(size_limit: usize) -> Self {
        QueryCache {
            cache: NonZeroUsize::new(size_limit).map(|cap| Mutex::new(LruCache::new(cap))),
            size_limit,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn get(&self, key: &QueryKey) -> Option<SearchResult> {
        let cache = self.cache.as_ref()?;
        match cache.lock().get(key) {
            Some(result) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Some(result.clone())
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: QueryKey, result: SearchResult) {
        if let Some(cache) = &self.cache {
            cache.lock().put(key, result);
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.as_ref().map_or(0, |c| c.lock().len()),
            capacity: self.size_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}
