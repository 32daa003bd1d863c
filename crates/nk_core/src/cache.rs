//! Explicit caches handed to the components that need them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait Cache<T>: Send + Sync {
    fn load(&self, key: &str) -> Option<T>;

    fn save(&self, key: &str, value: T, ttl: Duration);

    fn invalidate(&self, key: &str);
}

/// In-process cache with per-entry expiry.
pub struct MemoryCache<T> {
    entries: Mutex<HashMap<String, (Instant, T)>>,
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Cache<T> for MemoryCache<T> {
    fn load(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((expires_at, value)) if Instant::now() < *expires_at => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn save(&self, key: &str, value: T, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (Instant::now() + ttl, value));
        }
    }

    fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Cache that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl<T> Cache<T> for NoopCache {
    fn load(&self, _key: &str) -> Option<T> {
        None
    }

    fn save(&self, _key: &str, _value: T, _ttl: Duration) {}

    fn invalidate(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        cache.save("articles", vec![1, 2, 3], Duration::from_secs(60));
        assert_eq!(cache.load("articles"), Some(vec![1, 2, 3]));
        assert_eq!(cache.load("missing"), None);

        cache.invalidate("articles");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_memory_cache_expiry() {
        let cache = MemoryCache::new();
        cache.save("quote", "hello".to_string(), Duration::ZERO);
        assert_eq!(cache.load("quote"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_noop_cache() {
        let cache = NoopCache;
        Cache::<u32>::save(&cache, "k", 1, Duration::from_secs(60));
        assert_eq!(Cache::<u32>::load(&cache, "k"), None);
    }
}
