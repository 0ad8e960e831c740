// src/cache/sqlite.rs
use crate::cache::{CacheKey, PropertyCache};
use crate::db::connection::Database;
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use std::time::Duration;

/// Cache stored in the `cache_entries` table, shared by every worker thread.
pub struct SqliteCache {
    db: Database,
}

impl SqliteCache {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn read(&self, key: &str, now: i64) -> Result<Option<Value>, ServerError> {
        let raw: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "select value from cache_entries where key = ? and expires_at > ?",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ServerError::DbError(format!("cache lookup failed: {e}")))
        })?;

        raw.map(|text| {
            serde_json::from_str(&text)
                .map_err(|e| ServerError::DbError(format!("cache entry is not JSON: {e}")))
        })
        .transpose()
    }

    fn write(&self, key: &str, value: &Value, expires_at: i64) -> Result<(), ServerError> {
        let text = value.to_string();
        self.db.with_conn(|conn| {
            conn.execute(
                "insert into cache_entries (key, value, expires_at) values (?, ?, ?)
                 on conflict(key) do update set value = excluded.value, expires_at = excluded.expires_at",
                params![key, text, expires_at],
            )
            .map_err(|e| ServerError::DbError(format!("cache write failed: {e}")))?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), ServerError> {
        self.db.with_conn(|conn| {
            conn.execute("delete from cache_entries where key = ?", params![key])
                .map_err(|e| ServerError::DbError(format!("cache delete failed: {e}")))?;
            Ok(())
        })
    }

    /// Drop every expired row. Returns how many went.
    pub fn purge_expired(&self) -> Result<usize, ServerError> {
        let now = Utc::now().timestamp_millis();
        self.db.with_conn(|conn| {
            conn.execute(
                "delete from cache_entries where expires_at <= ?",
                params![now],
            )
            .map_err(|e| ServerError::DbError(format!("cache purge failed: {e}")))
        })
    }
}

impl PropertyCache for SqliteCache {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        let key = key.as_string();
        match self.read(&key, Utc::now().timestamp_millis()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Cache read failed");
                None
            }
        }
    }

    fn set(&self, key: &CacheKey, value: Value, ttl: Duration) {
        let key = key.as_string();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(ttl_ms);
        if let Err(e) = self.write(&key, &value, expires_at) {
            tracing::warn!(%key, error = %e, "Cache write failed");
        }
    }

    fn invalidate(&self, key: &CacheKey) {
        let key = key.as_string();
        if let Err(e) = self.delete(&key) {
            tracing::warn!(%key, error = %e, "Cache invalidate failed");
        }
    }
}
