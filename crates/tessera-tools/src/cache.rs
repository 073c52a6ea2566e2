use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 256;
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Bounded query-to-URL cache with LRU eviction and TTL expiry.
///
/// Entries expire lazily on read once their TTL passes. Inserting beyond
/// capacity evicts the least recently used entry. Callers share it behind a
/// mutex, so a racing insert for the same query is last-writer-wins.
pub struct ImageCache {
    entries: HashMap<String, CacheEntry>,
    capacity: usize,
    ttl: Duration,
    clock: u64,
}

struct CacheEntry {
    url: String,
    inserted_at: Instant,
    last_used: u64,
}

impl ImageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, query: &str) -> Option<String> {
        let expired = match self.entries.get(query) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return None,
        };

        if expired {
            self.entries.remove(query);
            tracing::debug!(query, "image cache entry expired");
            return None;
        }

        self.clock += 1;
        let clock = self.clock;
        let entry = self.entries.get_mut(query)?;
        entry.last_used = clock;
        Some(entry.url.clone())
    }

    pub fn insert(&mut self, query: impl Into<String>, url: impl Into<String>) {
        let query = query.into();
        if !self.entries.contains_key(&query) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.clock += 1;
        self.entries.insert(
            query,
            CacheEntry {
                url: url.into(),
                inserted_at: Instant::now(),
                last_used: self.clock,
            },
        );
    }

    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(query, _)| query.clone());
        if let Some(query) = victim {
            self.entries.remove(&query);
            tracing::debug!(query = %query, "evicted image cache entry");
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_cached_url() {
        let mut cache = ImageCache::new(4, DEFAULT_TTL);
        cache.insert("eiffel tower", "https://example.com/eiffel.jpg");
        assert_eq!(
            cache.get("eiffel tower").as_deref(),
            Some("https://example.com/eiffel.jpg")
        );
        assert!(cache.get("louvre").is_none());
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let mut cache = ImageCache::new(2, DEFAULT_TTL);
        cache.insert("a", "url-a");
        cache.insert("b", "url-b");
        cache.get("a");
        cache.insert("c", "url-c");

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").as_deref(), Some("url-a"));
        assert_eq!(cache.get("c").as_deref(), Some("url-c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_existing_key_does_not_evict() {
        let mut cache = ImageCache::new(2, DEFAULT_TTL);
        cache.insert("a", "url-a");
        cache.insert("b", "url-b");
        cache.insert("a", "url-a2");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").as_deref(), Some("url-a2"));
        assert_eq!(cache.get("b").as_deref(), Some("url-b"));
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let mut cache = ImageCache::new(4, Duration::ZERO);
        cache.insert("a", "url-a");
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }
}
