//! Bounded deduplication caches for generated values.
//!
//! Uniqueness of phone numbers, national ids and name pairs is enforced
//! best-effort within a run: each cache remembers the most recently seen
//! values up to a fixed capacity, evicting the least recently used entry when
//! full. A value evicted here can recur; the destination's conflict handling
//! absorbs those rare collisions.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::bail;
use crate::error::{ErrorKind, SeedResult};

/// An LRU-bounded set of already-issued values for one attribute domain.
#[derive(Debug)]
pub struct UniquenessCache {
    domain: &'static str,
    entries: Mutex<LruCache<String, ()>>,
}

impl UniquenessCache {
    /// Creates a cache holding at most `capacity` values.
    ///
    /// A zero capacity is coerced to one; config validation rejects zero
    /// before a pipeline is built, so this is purely a safety net.
    pub fn new(domain: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            domain,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns whether `value` is currently remembered, refreshing its
    /// recency if so.
    pub fn contains(&self, value: &str) -> bool {
        self.lock().get(value).is_some()
    }

    /// Remembers `value`, evicting the least recently used entry when full.
    pub fn add(&self, value: String) {
        self.lock().put(value, ());
    }

    /// Draws candidates from `generate` until one not present in the cache is
    /// found, remembering and returning it.
    ///
    /// Fails with [`ErrorKind::UniquenessExhausted`] after `max_attempts`
    /// consecutive collisions rather than spinning forever on a saturated
    /// value space.
    pub fn generate_unique<F>(&self, max_attempts: u32, mut generate: F) -> SeedResult<String>
    where
        F: FnMut() -> String,
    {
        for _ in 0..max_attempts {
            let candidate = generate();
            let mut entries = self.lock();
            if entries.get(&candidate).is_none() {
                entries.put(candidate.clone(), ());
                return Ok(candidate);
            }
        }

        bail!(
            ErrorKind::UniquenessExhausted,
            "Could not generate a unique value",
            format!(
                "{} attempts at a fresh '{}' value all collided with the cache",
                max_attempts, self.domain
            )
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, ()>> {
        // Poisoning is unrecoverable here; generation holds the lock only
        // for non-panicking map operations.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_contains() {
        let cache = UniquenessCache::new("phone", 8);
        assert!(!cache.contains("9876543210"));
        cache.add("9876543210".to_owned());
        assert!(cache.contains("9876543210"));
    }

    #[test]
    fn evicts_least_recently_used_when_full() {
        let cache = UniquenessCache::new("phone", 2);
        cache.add("a".to_owned());
        cache.add("b".to_owned());
        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.contains("a"));
        cache.add("c".to_owned());

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn generate_unique_skips_known_values() {
        let cache = UniquenessCache::new("id", 8);
        cache.add("dup".to_owned());

        let mut candidates = vec!["fresh".to_owned(), "dup".to_owned()];
        let value = cache
            .generate_unique(10, || candidates.pop().unwrap_or_else(|| "fresh".to_owned()))
            .unwrap();
        assert_eq!(value, "fresh");
        assert!(cache.contains("fresh"));
    }

    #[test]
    fn generate_unique_gives_up_after_max_attempts() {
        let cache = UniquenessCache::new("id", 8);
        cache.add("only".to_owned());

        let err = cache
            .generate_unique(5, || "only".to_owned())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UniquenessExhausted);
    }
}
