//! Injectable caches for classification results.

use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value cache shared between classifier calls.
pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: String, value: V);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: String, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
