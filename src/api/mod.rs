pub mod api_error;
pub mod client;
pub mod models;

pub use api_error::ApiError;
pub use client::{ListingsApi, Timeouts};

use crate::domain::property::PropertyStatus;
use models::{ListingPayload, LoginRequest};
use serde_json::Value;

pub type Query = Vec<(String, String)>;

/// One way of asking the backend for a set of listings.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointStrategy {
    /// `GET listings/get`, no server-side filtering.
    GetAll,
    /// `GET listings/search` with server-side filters.
    Search(Query),
    /// `GET listings/get` with server-side filters.
    Get(Query),
}

impl EndpointStrategy {
    /// Fallback order for a listing query.
    pub fn chain(server_query: Query) -> Vec<EndpointStrategy> {
        vec![
            EndpointStrategy::GetAll,
            EndpointStrategy::Search(server_query.clone()),
            EndpointStrategy::Get(server_query),
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            EndpointStrategy::GetAll => "get-all",
            EndpointStrategy::Search(_) => "search",
            EndpointStrategy::Get(_) => "get",
        }
    }
}

/// The listings backend as the service sees it. Bodies come back as raw JSON; envelope and
/// record handling happen above this seam.
pub trait ListingBackend: Send + Sync {
    fn fetch_listings(&self, strategy: &EndpointStrategy) -> Result<Value, ApiError>;

    fn fetch_listing(&self, id: i64) -> Result<Value, ApiError>;

    fn fetch_user_listings(&self, token: &str, query: &Query) -> Result<Value, ApiError>;

    fn create_listing(&self, token: &str, payload: &ListingPayload) -> Result<Value, ApiError>;

    fn update_listing(
        &self,
        token: &str,
        id: i64,
        payload: &ListingPayload,
    ) -> Result<Value, ApiError>;

    fn delete_listing(&self, token: &str, id: i64) -> Result<(), ApiError>;

    fn update_status(
        &self,
        token: &str,
        id: i64,
        status: PropertyStatus,
    ) -> Result<Value, ApiError>;

    fn login(&self, credentials: &LoginRequest) -> Result<Value, ApiError>;
}
