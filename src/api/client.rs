// client.rs
use crate::api::models::{ListingPayload, LoginRequest};
use crate::api::{ApiError, EndpointStrategy, ListingBackend, Query};
use crate::domain::property::PropertyStatus;
use crate::logging::truncate_for_logging;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("listing_gateway/", env!("CARGO_PKG_VERSION"));

/// Per-request deadlines. `extended` covers endpoints that carry image payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub default: Duration,
    pub extended: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            default: Duration::from_secs(10),
            extended: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP client for the listings backend.
pub struct ListingsApi {
    client: Client,
    base: Url,
    timeouts: Timeouts,
}

impl ListingsApi {
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        // Url::join drops the last path segment unless the base ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized)
            .map_err(|e| ApiError::InvalidRequest(format!("bad API base URL {base_url}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeouts.extended)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base,
            timeouts,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("bad endpoint path {path}: {e}")))
    }

    fn send(&self, request: RequestBuilder, slow: bool) -> Result<Value, ApiError> {
        let timeout = if slow {
            self.timeouts.extended
        } else {
            self.timeouts.default
        };

        let response = request
            .timeout(timeout)
            .send()
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        let url = response.url().to_string();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }

        let text = response.text().map_err(ApiError::from_transport)?;

        if !status.is_success() {
            let message: String = text.chars().take(200).collect();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        tracing::debug!(%url, body = %truncate_for_logging(&body), "Backend response");
        Ok(body)
    }
}

impl ListingBackend for ListingsApi {
    fn fetch_listings(&self, strategy: &EndpointStrategy) -> Result<Value, ApiError> {
        let request = match strategy {
            EndpointStrategy::GetAll => {
                let bust = chrono::Utc::now().timestamp_millis().to_string();
                self.client
                    .get(self.endpoint("listings/get")?)
                    .query(&[("refresh", bust)])
            }
            EndpointStrategy::Search(query) => self
                .client
                .get(self.endpoint("listings/search")?)
                .query(query),
            EndpointStrategy::Get(query) => {
                self.client.get(self.endpoint("listings/get")?).query(query)
            }
        };
        self.send(request, false)
    }

    fn fetch_listing(&self, id: i64) -> Result<Value, ApiError> {
        let url = self.endpoint(&format!("listings/get/{id}"))?;
        self.send(self.client.get(url), false)
    }

    fn fetch_user_listings(&self, token: &str, query: &Query) -> Result<Value, ApiError> {
        let request = self
            .client
            .get(self.endpoint("listings/user")?)
            .bearer_auth(token)
            .query(query);
        self.send(request, false)
    }

    fn create_listing(&self, token: &str, payload: &ListingPayload) -> Result<Value, ApiError> {
        let request = self
            .client
            .post(self.endpoint("listings/create")?)
            .bearer_auth(token)
            .json(payload);
        self.send(request, true)
    }

    fn update_listing(
        &self,
        token: &str,
        id: i64,
        payload: &ListingPayload,
    ) -> Result<Value, ApiError> {
        let request = self
            .client
            .put(self.endpoint(&format!("listings/update/{id}"))?)
            .bearer_auth(token)
            .json(payload);
        self.send(request, true)
    }

    fn delete_listing(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.endpoint(&format!("listings/delete/{id}"))?)
            .bearer_auth(token);
        self.send(request, false).map(|_| ())
    }

    fn update_status(
        &self,
        token: &str,
        id: i64,
        status: PropertyStatus,
    ) -> Result<Value, ApiError> {
        let request = self
            .client
            .put(self.endpoint(&format!("listings/status/{id}"))?)
            .bearer_auth(token)
            .query(&[("status", status.as_str())]);
        self.send(request, false)
    }

    fn login(&self, credentials: &LoginRequest) -> Result<Value, ApiError> {
        let request = self
            .client
            .post(self.endpoint("auth/login")?)
            .json(credentials);
        self.send(request, false)
    }
}
