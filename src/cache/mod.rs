pub mod memory;
pub mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use serde_json::Value;
use std::time::Duration;

/// Everything the service caches. Keys are only ever built here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Full listing set from the get-all endpoint, already unwrapped into records.
    AllListings,
    /// Single backend record.
    Listing(i64),
}

impl CacheKey {
    pub fn as_string(&self) -> String {
        match self {
            CacheKey::AllListings => "listings:all".to_string(),
            CacheKey::Listing(id) => format!("listings:id:{id}"),
        }
    }
}

/// Key/value store for backend payloads with per-entry time to live.
///
/// Implementations swallow their own storage errors: a broken cache reads as empty.
pub trait PropertyCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Value>;

    fn set(&self, key: &CacheKey, value: Value, ttl: Duration);

    fn invalidate(&self, key: &CacheKey);
}
