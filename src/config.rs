use crate::api::Timeouts;
use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Where session tokens live between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStore {
    /// Client cookie only.
    Cookie,
    /// Client cookie, falling back to the gateway-side SQLite slot written by login.
    Local,
}

impl FromStr for SessionStore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(SessionStore::Cookie),
            "local" => Ok(SessionStore::Local),
            other => bail!("unknown session store {other:?}, expected cookie or local"),
        }
    }
}

/// Where backend payloads are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStore {
    /// `cache_entries` table, shared by all workers and kept across restarts.
    Sqlite,
    /// Process memory.
    Memory,
}

impl FromStr for CacheStore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(CacheStore::Sqlite),
            "memory" => Ok(CacheStore::Memory),
            other => bail!("unknown cache store {other:?}, expected sqlite or memory"),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub max_workers: usize,
    pub request_timeout: Duration,
    pub extended_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_store: CacheStore,
    pub session_store: SessionStore,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &str, default: &str| -> Result<Duration> {
            let raw = var(key, default);
            let value: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?;
            Ok(Duration::from_secs(value))
        };

        let max_workers: usize = var("MAX_WORKERS", "8")
            .trim()
            .parse()
            .context("MAX_WORKERS must be a valid number")?;
        if max_workers == 0 {
            bail!("MAX_WORKERS must be at least 1");
        }

        Ok(Self {
            api_base_url: var("API_BASE_URL", "http://localhost:8080/api"),
            bind_addr: var("BIND_ADDR", "127.0.0.1:3000")
                .parse()
                .context("BIND_ADDR must be a socket address like 127.0.0.1:3000")?,
            database_path: var("DATABASE_PATH", "listing_gateway.sqlite3"),
            max_workers,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", "10")?,
            extended_timeout: secs("EXTENDED_TIMEOUT_SECS", "30")?,
            cache_ttl: secs("CACHE_TTL_SECS", "60")?,
            cache_store: var("CACHE_STORE", "sqlite").parse()?,
            session_store: var("SESSION_STORE", "cookie").parse()?,
        })
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            default: self.request_timeout,
            extended: self.extended_timeout.max(self.request_timeout),
        }
    }
}
