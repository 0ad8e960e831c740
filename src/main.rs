use crate::api::ListingsApi;
use crate::auth::LocalTokenStore;
use crate::cache::{MemoryCache, PropertyCache, SqliteCache};
use crate::config::{CacheStore, Config, SessionStore};
use crate::db::connection::{init_db, Database};
use crate::router::{handle, AppState};
use crate::service::PropertyService;
use anyhow::{Context, Result};
use astra::Server;

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod domain;
mod errors;
mod logging;
mod responses;
mod router;
mod sequence;
mod service;

#[cfg(test)]
mod tests;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_tracing();

    let db = Database::new(config.database_path.clone());
    init_db(&db).context("Database initialization failed")?;

    let cache: Box<dyn PropertyCache> = match config.cache_store {
        CacheStore::Sqlite => {
            let cache = SqliteCache::new(db.clone());
            match cache.purge_expired() {
                Ok(0) => {}
                Ok(n) => tracing::info!(purged = n, "Removed expired cache entries"),
                Err(e) => tracing::warn!(error = %e, "Cache purge failed"),
            }
            Box::new(cache)
        }
        CacheStore::Memory => Box::new(MemoryCache::new()),
    };

    let backend = ListingsApi::new(&config.api_base_url, config.timeouts())
        .context("Could not build listings client")?;
    let service = PropertyService::new(Box::new(backend), cache, config.cache_ttl);

    let local_tokens = match config.session_store {
        SessionStore::Local => Some(LocalTokenStore::new(db.clone())),
        SessionStore::Cookie => None,
    };

    let state = AppState {
        service,
        session_store: config.session_store,
        local_tokens,
    };

    tracing::info!(
        addr = %config.bind_addr,
        backend = %config.api_base_url,
        workers = config.max_workers,
        "Starting listing gateway"
    );

    Server::bind(&config.bind_addr)
        .max_workers(config.max_workers)
        .serve(move |req, _info| handle(req, &state))
        .context("Server ended with error")?;

    tracing::info!("Server shut down cleanly.");
    Ok(())
}
