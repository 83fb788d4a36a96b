//! In-memory cache of successful format results
//!
//! Cache key: blake3(language, resolved settings as JSON, code)
//! Cache value: formatted code
//! Eviction: FIFO by insertion, bounded capacity, no TTL
//!
//! Failures are never stored. Re-inserting an existing key keeps its
//! original insertion position.

use crate::settings::FormatterSettings;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Default number of cached results.
pub const DEFAULT_CAPACITY: usize = 50;

/// Cache statistics for reporting
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub writes: usize,
    pub evictions: usize,
}

impl CacheStats {
    /// Percentage of lookups that hit.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Content digest identifying one format request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(blake3::Hash);

impl CacheKey {
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Bounded FIFO cache for formatted code
pub struct FormatCache {
    entries: IndexMap<CacheKey, String>,
    capacity: usize,
    stats: CacheStats,
}

impl FormatCache {
    /// Create a cache holding at most `capacity` results. 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.min(1024)),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Compute the key for a request.
    ///
    /// Each field is length-prefixed so that shifting bytes between fields
    /// always changes the digest.
    pub fn key(language: &str, settings: &FormatterSettings, code: &str) -> CacheKey {
        let settings_json = serde_json::to_string(settings).unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        for part in [language, settings_json.as_str(), code] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        CacheKey(hasher.finalize())
    }

    /// Look up a cached result
    pub fn get(&mut self, key: &CacheKey) -> Option<String> {
        match self.entries.get(key) {
            Some(code) => {
                self.stats.hits += 1;
                Some(code.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a successful result, evicting the oldest entry when full.
    pub fn insert(&mut self, key: CacheKey, code: String) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = code;
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.shift_remove_index(0) {
                log::debug!("Evicting cached format result {evicted}");
                self.stats.evictions += 1;
            }
        }
        self.entries.insert(key, code);
        self.stats.writes += 1;
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for FormatCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(code: &str) -> CacheKey {
        FormatCache::key("javascript", &FormatterSettings::for_language("javascript"), code)
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let mut cache = FormatCache::new(4);
        assert!(cache.get(&key("a")).is_none());
        cache.insert(key("a"), "A".to_string());
        assert_eq!(cache.get(&key("a")).as_deref(), Some("A"));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.writes), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_key_depends_on_every_field() {
        let js = FormatterSettings::for_language("javascript");
        let base = FormatCache::key("javascript", &js, "x");
        assert_eq!(base, FormatCache::key("javascript", &js, "x"));
        assert_ne!(base, FormatCache::key("typescript", &js, "x"));
        assert_ne!(base, FormatCache::key("javascript", &FormatterSettings::for_language("python"), "x"));
        assert_ne!(base, FormatCache::key("javascript", &js, "y"));
    }

    #[test]
    fn test_key_fields_do_not_bleed_into_each_other() {
        let settings = FormatterSettings::default();
        assert_ne!(FormatCache::key("ab", &settings, "c"), FormatCache::key("a", &settings, "bc"));
    }

    #[test]
    fn test_fifo_eviction_ignores_access() {
        let mut cache = FormatCache::new(2);
        cache.insert(key("first"), "1".to_string());
        cache.insert(key("second"), "2".to_string());

        // Reading the oldest entry does not protect it.
        assert!(cache.get(&key("first")).is_some());

        cache.insert(key("third"), "3".to_string());
        assert!(!cache.contains(&key("first")));
        assert!(cache.contains(&key("second")));
        assert_eq!(cache.get(&key("third")).as_deref(), Some("3"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut cache = FormatCache::new(2);
        cache.insert(key("a"), "1".to_string());
        cache.insert(key("b"), "2".to_string());
        cache.insert(key("a"), "1".to_string());
        cache.insert(key("c"), "3".to_string());
        assert!(!cache.contains(&key("a")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables_storage() {
        let mut cache = FormatCache::new(0);
        cache.insert(key("a"), "1".to_string());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().writes, 0);
    }

    #[test]
    fn test_clear() {
        let mut cache = FormatCache::default();
        cache.insert(key("a"), "1".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(capacity in 1usize..16, inserts in prop::collection::vec("[a-z]{0,6}", 0..64)) {
            let mut cache = FormatCache::new(capacity);
            for code in &inserts {
                let before = cache.len();
                let k = key(code);
                let existed = cache.contains(&k);
                cache.insert(k, code.to_uppercase());

                prop_assert!(cache.len() <= capacity);
                prop_assert!(cache.contains(&k));
                if !existed && before == capacity {
                    prop_assert_eq!(cache.len(), capacity);
                }
            }
        }
    }
}
