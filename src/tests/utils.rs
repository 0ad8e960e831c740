use crate::api::models::{ListingPayload, LoginRequest};
use crate::api::{ApiError, EndpointStrategy, ListingBackend, Query};
use crate::auth::CookieSession;
use crate::cache::MemoryCache;
use crate::db::connection::{init_db, Database};
use crate::domain::property::PropertyStatus;
use crate::service::PropertyService;
use http::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh database file per call, with the production schema applied.
pub fn init_test_db() -> Database {
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "listing_gateway_test_{}_{n}.sqlite3",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub type Reply = Result<Value, ApiError>;

/// Scripted backend. Endpoints without a scripted reply fail with a network error.
#[derive(Default)]
pub struct FakeBackend {
    get_all: Option<Reply>,
    search: Option<Reply>,
    get: Option<Reply>,
    listings: HashMap<i64, Reply>,
    user: Option<Reply>,
    mutation: Option<Reply>,
    login: Option<Reply>,
    calls: Arc<Mutex<Vec<String>>>,
    payloads: Arc<Mutex<Vec<ListingPayload>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_all(mut self, reply: Reply) -> Self {
        self.get_all = Some(reply);
        self
    }

    pub fn search(mut self, reply: Reply) -> Self {
        self.search = Some(reply);
        self
    }

    pub fn get(mut self, reply: Reply) -> Self {
        self.get = Some(reply);
        self
    }

    pub fn listing(mut self, id: i64, reply: Reply) -> Self {
        self.listings.insert(id, reply);
        self
    }

    pub fn user(mut self, reply: Reply) -> Self {
        self.user = Some(reply);
        self
    }

    pub fn mutation(mut self, reply: Reply) -> Self {
        self.mutation = Some(reply);
        self
    }

    pub fn login(mut self, reply: Reply) -> Self {
        self.login = Some(reply);
        self
    }

    /// Shared view of every call made, in order.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    /// Shared view of every listing payload sent.
    pub fn payload_log(&self) -> Arc<Mutex<Vec<ListingPayload>>> {
        Arc::clone(&self.payloads)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn reply(slot: &Option<Reply>) -> Reply {
        slot.clone()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted reply".into())))
    }
}

impl ListingBackend for FakeBackend {
    fn fetch_listings(&self, strategy: &EndpointStrategy) -> Result<Value, ApiError> {
        self.record(strategy.label().to_string());
        match strategy {
            EndpointStrategy::GetAll => Self::reply(&self.get_all),
            EndpointStrategy::Search(_) => Self::reply(&self.search),
            EndpointStrategy::Get(_) => Self::reply(&self.get),
        }
    }

    fn fetch_listing(&self, id: i64) -> Result<Value, ApiError> {
        self.record(format!("listing:{id}"));
        self.listings
            .get(&id)
            .cloned()
            .unwrap_or(Err(ApiError::NotFound))
    }

    fn fetch_user_listings(&self, token: &str, _query: &Query) -> Result<Value, ApiError> {
        self.record(format!("user:{token}"));
        Self::reply(&self.user)
    }

    fn create_listing(&self, token: &str, payload: &ListingPayload) -> Result<Value, ApiError> {
        self.record(format!("create:{token}"));
        self.payloads.lock().unwrap().push(payload.clone());
        Self::reply(&self.mutation)
    }

    fn update_listing(
        &self,
        token: &str,
        id: i64,
        payload: &ListingPayload,
    ) -> Result<Value, ApiError> {
        self.record(format!("update:{token}:{id}"));
        self.payloads.lock().unwrap().push(payload.clone());
        Self::reply(&self.mutation)
    }

    fn delete_listing(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.record(format!("delete:{token}:{id}"));
        Self::reply(&self.mutation).map(|_| ())
    }

    fn update_status(
        &self,
        token: &str,
        id: i64,
        status: PropertyStatus,
    ) -> Result<Value, ApiError> {
        self.record(format!("status:{token}:{id}:{status}"));
        Self::reply(&self.mutation)
    }

    fn login(&self, credentials: &LoginRequest) -> Result<Value, ApiError> {
        self.record(format!("login:{}", credentials.email));
        Self::reply(&self.login)
    }
}

/// Service over `backend` with an in-memory cache.
pub fn service_with(backend: FakeBackend) -> PropertyService {
    PropertyService::new(
        Box::new(backend),
        Box::new(MemoryCache::new()),
        Duration::from_secs(60),
    )
}

/// Cookie session carrying `token` as a bearer header, or nothing.
pub fn session_with(token: Option<&str>) -> CookieSession {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
    }
    CookieSession::from_headers(&headers, chrono::Utc::now().timestamp())
}

pub fn calls(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
