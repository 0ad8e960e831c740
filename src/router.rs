use crate::api::models::LoginRequest;
use crate::auth::{CookieSession, LayeredSession, LocalTokenStore, TokenProvider};
use crate::config::SessionStore;
use crate::domain::property::{Property, PropertyStatus};
use crate::domain::search::SearchParams;
use crate::errors::ServerError;
use crate::responses::{error_to_response, json_response, message_response, ResultResp};
use crate::service::{PropertyService, FEATURED_LIMIT, RECENT_LIMIT};
use astra::{Body, Request, Response};
use chrono::Utc;
use http::header::SET_COOKIE;
use http::request::Parts;
use http::HeaderValue;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;
use std::time::Instant;

/// Everything a worker needs to answer a request.
pub struct AppState {
    pub service: PropertyService,
    pub session_store: SessionStore,
    /// Present when `session_store` is `Local`.
    pub local_tokens: Option<LocalTokenStore>,
}

pub fn handle(req: Request, state: &AppState) -> Response {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let cookie = CookieSession::from_headers(&parts.headers, Utc::now().timestamp());
    let layered;
    let session: &dyn TokenProvider = match (state.session_store, &state.local_tokens) {
        (SessionStore::Local, Some(local)) => {
            layered = LayeredSession::new(local, &cookie);
            &layered
        }
        _ => &cookie,
    };

    let mut response = match route(&parts, body, state, session) {
        Ok(resp) => resp,
        Err(err) => {
            if matches!(err, ServerError::Unauthorized(_)) {
                if let Err(e) = session.clear_token() {
                    tracing::warn!(error = %e, "Could not clear rejected token");
                }
            }
            error_to_response(&err)
        }
    };

    if let Some(set_cookie) = cookie.take_set_cookie() {
        match HeaderValue::from_str(&set_cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Dropping unrepresentable Set-Cookie"),
        }
    }

    tracing::info!(
        method = %parts.method,
        path = parts.uri.path(),
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

fn route(parts: &Parts, body: Body, state: &AppState, session: &dyn TokenProvider) -> ResultResp {
    let service = &state.service;
    let query = parse_query(parts.uri.query());
    let segments: Vec<&str> = parts
        .uri
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (parts.method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => json_response(200, &json!({ "status": "ok" })),

        ("GET", ["properties"]) => {
            let params = search_params(&query)?;
            json_response(200, &service.get_properties(&params)?)
        }
        ("GET", ["properties", "featured"]) => {
            let limit = limit_param(&query, FEATURED_LIMIT)?;
            json_response(200, &service.get_featured_properties(limit)?)
        }
        ("GET", ["properties", "recent"]) => {
            let limit = limit_param(&query, RECENT_LIMIT)?;
            json_response(200, &service.get_recent_properties(limit)?)
        }
        ("GET", ["properties", "mine"]) => {
            let params = search_params(&query)?;
            json_response(200, &service.get_user_listings(session, &params)?)
        }
        ("GET", ["properties", id]) => {
            let property = service.get_property_by_id(parse_id(id)?, session)?;
            json_response(200, &property)
        }
        ("POST", ["properties"]) => {
            let property: Property = read_json(body)?;
            json_response(201, &service.create_property(session, &property)?)
        }
        ("PUT", ["properties", id]) => {
            let id = parse_id(id)?;
            let property: Property = read_json(body)?;
            json_response(200, &service.update_property(session, id, &property)?)
        }
        ("PUT", ["properties", id, "status"]) => {
            let id = parse_id(id)?;
            let status: PropertyStatus = query
                .get("status")
                .ok_or_else(|| ServerError::BadRequest("missing `status`".into()))?
                .parse()
                .map_err(ServerError::BadRequest)?;
            let updated = service.update_property_status(session, id, status)?;
            json_response(200, &json!({ "success": true, "property": updated }))
        }
        ("DELETE", ["properties", id]) => {
            service.delete_property(session, parse_id(id)?)?;
            message_response(200, true, "Listing deleted")
        }

        ("POST", ["auth", "login"]) => {
            let credentials: LoginRequest = read_json(body)?;
            let token = service.login(&credentials)?;
            session.set_token(&token)?;
            message_response(200, true, "Logged in")
        }
        ("POST", ["auth", "logout"]) => {
            session.clear_token()?;
            message_response(200, true, "Logged out")
        }

        _ => Err(ServerError::NotFound),
    }
}

fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn search_params(query: &HashMap<String, String>) -> Result<SearchParams, ServerError> {
    SearchParams::from_query(query).map_err(ServerError::BadRequest)
}

fn limit_param(query: &HashMap<String, String>, default: usize) -> Result<usize, ServerError> {
    match query.get("limit").map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ServerError::BadRequest(format!("invalid `limit`: {raw}"))),
    }
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::BadRequest(format!("invalid listing id: {raw}")))
}

fn read_json<T: DeserializeOwned>(mut body: Body) -> Result<T, ServerError> {
    let mut bytes = Vec::new();
    body.reader()
        .read_to_end(&mut bytes)
        .map_err(|e| ServerError::BadRequest(format!("could not read body: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}
