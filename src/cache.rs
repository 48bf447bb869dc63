//! Memoization of extraction results.
//!
//! Identical inputs produce identical metric tables, so results are kept in a
//! bounded least-recently-used cache keyed by a SHA-256 digest of every input
//! parameter: text, language, model size, metric groups, split flag, and
//! document label.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::options::{MetricGroup, ModelSize};
use crate::table::MetricsTable;

/// Canonical digest of one extraction's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        text: &str,
        language: &str,
        model_size: ModelSize,
        metrics: &[MetricGroup],
        split_by_line: bool,
        label: Option<&str>,
    ) -> Self {
        let mut metrics: Vec<&str> = metrics.iter().map(|m| m.as_str()).collect();
        metrics.sort_unstable();
        metrics.dedup();
        let metrics = metrics.join(",");

        let mut hasher = Sha256::new();
        // Length-prefix each field so that no two tuples share an encoding.
        for field in [
            text,
            language,
            model_size.short(),
            metrics.as_str(),
            if split_by_line { "1" } else { "0" },
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        match label {
            Some(label) => {
                hasher.update([1u8]);
                hasher.update((label.len() as u64).to_le_bytes());
                hasher.update(label.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct Entry {
    table: MetricsTable,
    last_used: u64,
}

/// Bounded LRU of extraction results. A capacity of `0` disables caching.
pub struct ResultCache {
    capacity: usize,
    tick: u64,
    entries: HashMap<CacheKey, Entry>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<MetricsTable> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.table.clone()
        })
    }

    pub fn insert(&mut self, key: CacheKey, table: MetricsTable) {
        if self.capacity == 0 {
            return;
        }
        self.tick += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            Entry {
                table,
                last_used: self.tick,
            },
        );
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::debug!(key = key.as_str(), "evicting cached result");
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> CacheKey {
        CacheKey::new(
            text,
            "en",
            ModelSize::Small,
            &[MetricGroup::Readability],
            true,
            None,
        )
    }

    fn table(marker: &str) -> MetricsTable {
        let mut t = MetricsTable::new(["text"]);
        t.push_row(vec![marker.into()]).unwrap();
        t
    }

    #[test]
    fn test_key_depends_on_every_field() {
        let base = key("hello");
        let metrics = [MetricGroup::Readability];
        let variants = [
            CacheKey::new("hello!", "en", ModelSize::Small, &metrics, true, None),
            CacheKey::new("hello", "da", ModelSize::Small, &metrics, true, None),
            CacheKey::new("hello", "en", ModelSize::Large, &metrics, true, None),
            CacheKey::new("hello", "en", ModelSize::Small, &[MetricGroup::Quality], true, None),
            CacheKey::new("hello", "en", ModelSize::Small, &metrics, false, None),
            CacheKey::new("hello", "en", ModelSize::Small, &metrics, true, Some("a.txt")),
        ];
        for v in variants {
            assert_ne!(v, base);
        }
    }

    #[test]
    fn test_key_ignores_metric_order() {
        let a = CacheKey::new(
            "t",
            "en",
            ModelSize::Small,
            &[MetricGroup::Quality, MetricGroup::Readability],
            true,
            None,
        );
        let b = CacheKey::new(
            "t",
            "en",
            ModelSize::Small,
            &[MetricGroup::Readability, MetricGroup::Quality],
            true,
            None,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_hit_and_miss() {
        let mut cache = ResultCache::new(4);
        assert!(cache.get(&key("a")).is_none());
        cache.insert(key("a"), table("a"));
        assert_eq!(cache.get(&key("a")), Some(table("a")));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = ResultCache::new(2);
        cache.insert(key("a"), table("a"));
        cache.insert(key("b"), table("b"));
        // Touch "a" so "b" becomes the oldest.
        assert!(cache.get(&key("a")).is_some());
        cache.insert(key("c"), table("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn test_zero_capacity_disables() {
        let mut cache = ResultCache::new(0);
        cache.insert(key("a"), table("a"));
        assert!(cache.is_empty());
        assert!(cache.get(&key("a")).is_none());
    }

    #[test]
    fn test_clear() {
        let mut cache = ResultCache::new(4);
        cache.insert(key("a"), table("a"));
        cache.insert(key("b"), table("b"));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }
}
