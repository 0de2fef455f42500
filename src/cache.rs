//! Bounded LRU caches for compiled queries and `/=` regexes
//!
//! Both caches sit behind a `Mutex` so a shared engine can be used from
//! several threads. The lock is never held while compiling: two threads that
//! miss on the same key both compile, and the last insert wins.

use crate::selector::Query;
use lru::LruCache;
use regex_automata::meta::Regex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Hit/miss counters and current occupancy of the query cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub queries: usize,
    pub regexes: usize,
}

/// Compiled query cache keyed by trimmed selector text
#[derive(Debug)]
pub struct QueryCache {
    entries: Mutex<LruCache<String, Arc<Query>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        QueryCache {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Query>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a compiled query, counting the hit or miss
    pub fn get(&self, selector: &str) -> Option<Arc<Query>> {
        let found = self.lock().get(selector).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, selector: &str, query: Arc<Query>) {
        self.lock().put(selector.to_string(), query);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Compiled `/=` pattern cache keyed by pattern source
#[derive(Debug)]
pub struct RegexCache {
    entries: Mutex<LruCache<String, Arc<Regex>>>,
}

impl RegexCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        RegexCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Regex>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a compiled pattern, building and caching it on a miss
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, String> {
        if let Some(regex) = self.lock().get(pattern) {
            return Ok(Arc::clone(regex));
        }
        let regex = Arc::new(Regex::new(pattern).map_err(|e| e.to_string())?);
        self.lock().put(pattern.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(selector: &str) -> Query {
        crate::selector::compile(selector).unwrap()
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_query_cache_counts_hits_and_misses() {
        let cache = QueryCache::new(capacity(4));
        assert!(cache.get("panel").is_none());
        cache.insert("panel", Arc::new(query("panel")));
        assert!(cache.get("panel").is_some());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_query_cache_evicts_least_recent() {
        let cache = QueryCache::new(capacity(2));
        cache.insert("a", Arc::new(query("a")));
        cache.insert("b", Arc::new(query("b")));
        assert!(cache.get("a").is_some());
        cache.insert("c", Arc::new(query("c")));
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_regex_cache_reuses_compiled_pattern() {
        let cache = RegexCache::new(capacity(2));
        let first = cache.get_or_compile("^foo").unwrap();
        let second = cache.get_or_compile("^foo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get_or_compile("(").is_err());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
