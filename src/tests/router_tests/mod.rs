mod auth_tests;
mod property_tests;

use crate::auth::LocalTokenStore;
use crate::config::SessionStore;
use crate::router::{handle, AppState};
use crate::tests::utils::{service_with, FakeBackend};
use astra::Body;
use http::{Method, Request};
use serde_json::Value;
use std::io::Read;

pub struct TestResponse {
    pub status: u16,
    pub body: Value,
    pub set_cookie: Option<String>,
}

pub fn cookie_state(backend: FakeBackend) -> AppState {
    AppState {
        service: service_with(backend),
        session_store: SessionStore::Cookie,
        local_tokens: None,
    }
}

pub fn local_state(backend: FakeBackend, store: LocalTokenStore) -> AppState {
    AppState {
        service: service_with(backend),
        session_store: SessionStore::Local,
        local_tokens: Some(store),
    }
}

/// Run one request through the router and decode the JSON body.
pub fn send(
    state: &AppState,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();

    let resp = handle(req, state);
    let status = resp.status().as_u16();
    let set_cookie = resp
        .headers()
        .get("Set-Cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut text = String::new();
    resp.into_body().reader().read_to_string(&mut text).unwrap();
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);

    TestResponse {
        status,
        body,
        set_cookie,
    }
}
