use crate::cache::{CacheKey, PropertyCache};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Process-local cache. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    /// `None` deadline: the TTL runs past what `Instant` can represent, so it never expires.
    entries: Mutex<HashMap<CacheKey, (Value, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((value, expires_at)) if expires_at.map_or(true, |at| at > Instant::now()) => {
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &CacheKey, value: Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(*key, (value, Instant::now().checked_add(ttl)));
        }
    }

    fn invalidate(&self, key: &CacheKey) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
