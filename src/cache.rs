//! Time-windowed memoization for external call results.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default freshness window for cached search and extraction results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A key/value store whose entries expire after a fixed window.
pub trait ResultCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn insert(&self, key: &str, value: V);
}

struct Entry<V> {
    stored_at: Instant,
    value: V,
}

/// In-memory cache keyed by the primary input text.
///
/// Concurrent misses on the same key are not deduplicated.
pub struct TtlCache<V> {
    max_age: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V> TtlCache<V> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send> ResultCache<V> for TtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        let fresh = entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() <= self.max_age)?;

        if !fresh {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    fn insert(&self, key: &str, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            let max_age = self.max_age;
            entries.retain(|_, entry| entry.stored_at.elapsed() <= max_age);
            entries.insert(
                key.to_string(),
                Entry {
                    stored_at: Instant::now(),
                    value,
                },
            );
        }
    }
}

/// Cache that never stores anything.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[cfg(test)]
impl<V> ResultCache<V> for NoCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn insert(&self, _key: &str, _value: V) {}
}
