// src/service/properties.rs
use crate::api::models::{extract_access_token, extract_records, extract_single, ListingPayload, LoginRequest};
use crate::api::{ApiError, EndpointStrategy};
use crate::auth::TokenProvider;
use crate::cache::CacheKey;
use crate::domain::property::{map_backend_to_frontend, Property, PropertyStatus};
use crate::domain::search::{filter_properties, paginate, PropertyPage, SearchParams, SortOrder};
use crate::service::PropertyService;
use serde_json::Value;

impl PropertyService {
    /// One page of listings matching `params`.
    ///
    /// Backend filtering is only a hint: whichever endpoint answers, the records are filtered,
    /// sorted and paged here. When every endpoint fails the page is empty.
    pub fn get_properties(&self, params: &SearchParams) -> Result<PropertyPage, ApiError> {
        let Some(records) = self.listing_records(params)? else {
            return Ok(PropertyPage::empty(params));
        };

        let properties: Vec<Property> = records.iter().map(map_backend_to_frontend).collect();
        Ok(paginate(filter_properties(&properties, params), params))
    }

    /// Raw records for a listing query: the cached full set when fresh, otherwise the
    /// fallback chain.
    fn listing_records(&self, params: &SearchParams) -> Result<Option<Vec<Value>>, ApiError> {
        if !params.refresh {
            if let Some(Value::Array(records)) = self.cache.get(&CacheKey::AllListings) {
                tracing::debug!(count = records.len(), "Serving listings from cache");
                return Ok(Some(records));
            }
        }

        self.retrieve(&EndpointStrategy::chain(params.to_server_query()))
    }

    /// A single listing: direct lookup, then the caller's own listings, then the active set.
    pub fn get_property_by_id(
        &self,
        id: i64,
        session: &dyn TokenProvider,
    ) -> Result<Property, ApiError> {
        if id <= 0 {
            return Err(ApiError::InvalidRequest(format!("invalid listing id {id}")));
        }

        let key = CacheKey::Listing(id);
        if let Some(record) = self.cache.get(&key) {
            return Ok(map_backend_to_frontend(&record));
        }

        match self
            .backend
            .fetch_listing(id)
            .and_then(|body| extract_single(&body))
        {
            Ok(Some(record)) => {
                self.cache.set(&key, record.clone(), self.cache_ttl);
                return Ok(map_backend_to_frontend(&record));
            }
            Ok(None) => tracing::debug!(id, "Direct lookup returned no record"),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(id, error = %e, "Direct lookup failed, searching listing sets")
            }
            Err(e) => return Err(e),
        }

        if let Some(token) = session.get_token() {
            match self
                .backend
                .fetch_user_listings(&token, &Vec::new())
                .and_then(|body| extract_records(&body))
            {
                Ok(records) => {
                    if let Some(found) = find_by_id(&records, id) {
                        return Ok(found);
                    }
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(id, error = %e, "User listings lookup failed")
                }
                Err(e) => return Err(e),
            }
        }

        let active = SearchParams {
            status: Some(PropertyStatus::Active),
            ..Default::default()
        };
        let records = self.listing_records(&active)?.unwrap_or_default();
        find_by_id(&records, id)
            .filter(|property| property.status == PropertyStatus::Active)
            .ok_or(ApiError::NotFound)
    }

    /// Listings owned by the session's user. No token means an empty page; so does any
    /// backend failure other than a rejected token or a timeout.
    pub fn get_user_listings(
        &self,
        session: &dyn TokenProvider,
        params: &SearchParams,
    ) -> Result<PropertyPage, ApiError> {
        let Some(token) = session.get_token() else {
            tracing::info!("No session token, user listings are empty");
            return Ok(PropertyPage::empty(params));
        };

        let query = params.to_server_query();

        let records = match self
            .backend
            .fetch_user_listings(&token, &query)
            .and_then(|body| extract_records(&body))
        {
            Ok(records) => records,
            Err(e @ (ApiError::Unauthorized { .. } | ApiError::Timeout)) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "User listings request failed");
                return Ok(PropertyPage::empty(params));
            }
        };

        let properties: Vec<Property> = records.iter().map(map_backend_to_frontend).collect();
        Ok(paginate(filter_properties(&properties, params), params))
    }

    pub fn create_property(
        &self,
        session: &dyn TokenProvider,
        property: &Property,
    ) -> Result<Property, ApiError> {
        let token = session.get_token().ok_or(ApiError::MissingToken)?;
        let payload = ListingPayload::from(property);

        let body = self.backend.create_listing(&token, &payload)?;
        self.invalidate_all_listings();

        let created = echoed_property(&body).unwrap_or_else(|| property.clone());
        tracing::info!(id = ?created.id, title = %created.title, "Listing created");
        Ok(created)
    }

    pub fn update_property(
        &self,
        session: &dyn TokenProvider,
        id: i64,
        property: &Property,
    ) -> Result<Property, ApiError> {
        if id <= 0 {
            return Err(ApiError::InvalidRequest(format!("invalid listing id {id}")));
        }
        let token = session.get_token().ok_or(ApiError::MissingToken)?;
        let payload = ListingPayload::from(property);

        let body = self.backend.update_listing(&token, id, &payload)?;
        self.invalidate_listing(id);

        Ok(echoed_property(&body).unwrap_or_else(|| Property {
            id: Some(id),
            ..property.clone()
        }))
    }

    pub fn delete_property(&self, session: &dyn TokenProvider, id: i64) -> Result<(), ApiError> {
        if id <= 0 {
            return Err(ApiError::InvalidRequest(format!("invalid listing id {id}")));
        }
        let token = session.get_token().ok_or(ApiError::MissingToken)?;

        self.backend.delete_listing(&token, id)?;
        self.invalidate_listing(id);
        tracing::info!(id, "Listing deleted");
        Ok(())
    }

    /// Returns the updated listing when the backend echoes it.
    pub fn update_property_status(
        &self,
        session: &dyn TokenProvider,
        id: i64,
        status: PropertyStatus,
    ) -> Result<Option<Property>, ApiError> {
        if id <= 0 {
            return Err(ApiError::InvalidRequest(format!("invalid listing id {id}")));
        }
        let token = session.get_token().ok_or(ApiError::MissingToken)?;

        let body = self.backend.update_status(&token, id, status)?;
        self.invalidate_listing(id);
        Ok(echoed_property(&body))
    }

    /// First `limit` active listings.
    pub fn get_featured_properties(&self, limit: usize) -> Result<Vec<Property>, ApiError> {
        let params = SearchParams {
            status: Some(PropertyStatus::Active),
            page: Some(0),
            limit: Some(limit),
            ..Default::default()
        };
        Ok(self.get_properties(&params)?.content)
    }

    /// The `limit` most recently created listings.
    pub fn get_recent_properties(&self, limit: usize) -> Result<Vec<Property>, ApiError> {
        let params = SearchParams {
            sort_by: Some("createdAt".to_string()),
            sort_order: Some(SortOrder::Desc),
            page: Some(0),
            limit: Some(limit),
            ..Default::default()
        };
        Ok(self.get_properties(&params)?.content)
    }

    /// Exchange credentials for an access token. A response without one is a rejection.
    pub fn login(&self, credentials: &LoginRequest) -> Result<String, ApiError> {
        let body = self.backend.login(credentials)?;
        extract_access_token(&body).ok_or(ApiError::Unauthorized { status: 401 })
    }

    fn invalidate_listing(&self, id: i64) {
        self.invalidate_all_listings();
        self.cache.invalidate(&CacheKey::Listing(id));
    }

    /// Drop the cached full set and supersede any get-all still in flight, so a response
    /// fetched before the mutation cannot write the old set back.
    fn invalidate_all_listings(&self) {
        self.sequencer.issue(&CacheKey::AllListings.as_string());
        self.cache.invalidate(&CacheKey::AllListings);
    }
}

fn find_by_id(records: &[Value], id: i64) -> Option<Property> {
    records
        .iter()
        .map(map_backend_to_frontend)
        .find(|property| property.id == Some(id))
}

fn echoed_property(body: &Value) -> Option<Property> {
    match extract_single(body) {
        Ok(Some(record)) => Some(map_backend_to_frontend(&record)),
        _ => None,
    }
}
