// src/auth/session.rs
use crate::auth::cookies::{expired_token_cookie, request_token, token_cookie};
use crate::auth::token::{token_fingerprint, usable_bearer};
use crate::db::connection::Database;
use crate::errors::ServerError;
use chrono::Utc;
use http::HeaderMap;
use rusqlite::{params, OptionalExtension};
use std::cell::RefCell;

/// The one place session tokens are read from and written to.
pub trait TokenProvider {
    /// A token that is present and not known to be expired.
    fn get_token(&self) -> Option<String>;

    fn set_token(&self, token: &str) -> Result<(), ServerError>;

    fn clear_token(&self) -> Result<(), ServerError>;
}

/// Token carried by the client: read from the request, written back as `Set-Cookie`.
#[derive(Debug)]
pub struct CookieSession {
    token: RefCell<Option<String>>,
    pending: RefCell<Option<String>>,
    now: i64,
}

impl CookieSession {
    pub fn from_headers(headers: &HeaderMap, now: i64) -> Self {
        Self {
            token: RefCell::new(request_token(headers)),
            pending: RefCell::new(None),
            now,
        }
    }

    /// `Set-Cookie` value to attach to the response, if the token changed.
    pub fn take_set_cookie(&self) -> Option<String> {
        self.pending.borrow_mut().take()
    }
}

impl TokenProvider for CookieSession {
    fn get_token(&self) -> Option<String> {
        let token = self.token.borrow();
        usable_bearer(token.as_deref()?, self.now).map(str::to_string)
    }

    fn set_token(&self, token: &str) -> Result<(), ServerError> {
        *self.token.borrow_mut() = Some(token.to_string());
        *self.pending.borrow_mut() = Some(token_cookie(token, self.now));
        Ok(())
    }

    fn clear_token(&self) -> Result<(), ServerError> {
        *self.token.borrow_mut() = None;
        *self.pending.borrow_mut() = Some(expired_token_cookie());
        Ok(())
    }
}

/// Token held by the gateway itself in the `local_tokens` table.
#[derive(Debug, Clone)]
pub struct LocalTokenStore {
    db: Database,
    slot: String,
}

impl LocalTokenStore {
    pub const DEFAULT_SLOT: &'static str = "default";

    pub fn new(db: Database) -> Self {
        Self::with_slot(db, Self::DEFAULT_SLOT)
    }

    pub fn with_slot(db: Database, slot: impl Into<String>) -> Self {
        Self {
            db,
            slot: slot.into(),
        }
    }

    fn load(&self) -> Result<Option<String>, ServerError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "select token from local_tokens where slot = ?",
                params![self.slot],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ServerError::DbError(format!("token lookup failed: {e}")))
        })
    }
}

impl TokenProvider for LocalTokenStore {
    fn get_token(&self) -> Option<String> {
        let stored = match self.load() {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Local token read failed");
                return None;
            }
        };
        usable_bearer(&stored, Utc::now().timestamp()).map(str::to_string)
    }

    fn set_token(&self, token: &str) -> Result<(), ServerError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "insert into local_tokens (slot, token, updated_at) values (?, ?, ?)
                 on conflict(slot) do update set token = excluded.token, updated_at = excluded.updated_at",
                params![self.slot, token, now],
            )
            .map_err(|e| ServerError::DbError(format!("token store failed: {e}")))?;
            Ok(())
        })?;
        tracing::debug!(slot = %self.slot, token = %token_fingerprint(token), "Stored local token");
        Ok(())
    }

    fn clear_token(&self) -> Result<(), ServerError> {
        self.db.with_conn(|conn| {
            conn.execute("delete from local_tokens where slot = ?", params![self.slot])
                .map_err(|e| ServerError::DbError(format!("token clear failed: {e}")))?;
            Ok(())
        })
    }
}

/// The request's own cookie first, the gateway-held token second. Only explicit writes
/// (login, logout, rejection) touch the local store; a client's cookie is never copied into it.
pub struct LayeredSession<'a> {
    local: &'a LocalTokenStore,
    cookie: &'a CookieSession,
}

impl<'a> LayeredSession<'a> {
    pub fn new(local: &'a LocalTokenStore, cookie: &'a CookieSession) -> Self {
        Self { local, cookie }
    }
}

impl TokenProvider for LayeredSession<'_> {
    fn get_token(&self) -> Option<String> {
        self.cookie.get_token().or_else(|| self.local.get_token())
    }

    fn set_token(&self, token: &str) -> Result<(), ServerError> {
        self.local.set_token(token)?;
        self.cookie.set_token(token)
    }

    fn clear_token(&self) -> Result<(), ServerError> {
        let local = self.local.clear_token();
        self.cookie.clear_token()?;
        local
    }
}
