use super::{cookie_state, send};
use crate::api::{ApiError, ListingsApi, Timeouts};
use crate::cache::MemoryCache;
use crate::config::SessionStore;
use crate::router::AppState;
use crate::service::PropertyService;
use crate::tests::utils::{calls, FakeBackend};
use http::Method;
use serde_json::{json, Value};
use std::time::Duration;

fn sample_listings() -> Value {
    json!({
        "success": true,
        "listings": [
            { "id": "5", "name": "Cozy Flat", "listingType": "rent", "amenities": "Pool, Gym", "price": 1500 },
            { "id": 6, "title": "Family Home", "listingType": "SALE", "price": 420000, "bedrooms": 4,
              "user": { "id": 3, "firstName": "Ana", "lastName": "Reyes", "email": "ana@example.com" } },
        ]
    })
}

#[test]
fn health_reports_ok() {
    let state = cookie_state(FakeBackend::new());
    let resp = send(&state, Method::GET, "/health", &[], None);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["status"], "ok");
}

#[test]
fn lists_normalized_properties() {
    let state = cookie_state(FakeBackend::new().get_all(Ok(sample_listings())));
    let resp = send(&state, Method::GET, "/properties?listingType=rent", &[], None);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["totalElements"], 1);
    assert_eq!(resp.body["totalPages"], 1);

    let flat = &resp.body["content"][0];
    assert_eq!(flat["id"], 5);
    assert_eq!(flat["title"], "Cozy Flat");
    assert_eq!(flat["listingType"], "RENT");
    assert_eq!(flat["amenities"], json!(["Pool", "Gym"]));
    assert_eq!(flat["images"], json!(["assets/images/prpty.jpg"]));
}

#[test]
fn nested_owner_is_exposed_flat() {
    let state = cookie_state(FakeBackend::new().get_all(Ok(sample_listings())));
    let resp = send(&state, Method::GET, "/properties?minPrice=100000", &[], None);

    let home = &resp.body["content"][0];
    assert_eq!(home["ownerId"], 3);
    assert_eq!(home["ownerName"], "Ana Reyes");
    assert_eq!(home["contactEmail"], "ana@example.com");
}

#[test]
fn query_strings_are_url_decoded() {
    let state = cookie_state(FakeBackend::new().get_all(Ok(sample_listings())));
    let resp = send(&state, Method::GET, "/properties?search=cozy%20flat", &[], None);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["totalElements"], 1);
    assert_eq!(resp.body["content"][0]["id"], 5);
}

#[test]
fn falls_back_through_the_endpoint_chain() {
    let backend = FakeBackend::new()
        .get_all(Err(ApiError::Network("reset".into())))
        .search(Err(ApiError::Decode("html".into())))
        .get(Ok(sample_listings()));
    let log = backend.call_log();
    let state = cookie_state(backend);

    let resp = send(&state, Method::GET, "/properties", &[], None);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["totalElements"], 2);
    assert_eq!(calls(&log), vec!["get-all", "search", "get"]);
}

#[test]
fn exhausted_chain_serves_an_empty_page() {
    let state = cookie_state(FakeBackend::new());
    let resp = send(&state, Method::GET, "/properties", &[], None);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["content"], json!([]));
    assert_eq!(resp.body["totalElements"], 0);
    assert_eq!(resp.body["totalPages"], 0);
}

#[test]
fn unreachable_backend_serves_an_empty_page() {
    let api = ListingsApi::new(
        "http://127.0.0.1:1/api",
        Timeouts {
            default: Duration::from_secs(2),
            extended: Duration::from_secs(2),
        },
    )
    .unwrap();
    let state = AppState {
        service: PropertyService::new(
            Box::new(api),
            Box::new(MemoryCache::new()),
            Duration::from_secs(60),
        ),
        session_store: SessionStore::Cookie,
        local_tokens: None,
    };

    let resp = send(&state, Method::GET, "/properties", &[], None);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["totalElements"], 0);
}

#[test]
fn backend_timeout_is_a_gateway_timeout() {
    let state = cookie_state(FakeBackend::new().get_all(Err(ApiError::Timeout)));
    let resp = send(&state, Method::GET, "/properties", &[], None);

    assert_eq!(resp.status, 504);
    assert_eq!(resp.body["success"], false);
}

#[test]
fn bad_query_values_are_rejected() {
    let state = cookie_state(FakeBackend::new());

    let resp = send(&state, Method::GET, "/properties?bedrooms=lots", &[], None);
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["success"], false);

    let resp = send(&state, Method::GET, "/properties/featured?limit=0", &[], None);
    assert_eq!(resp.status, 400);
}

#[test]
fn property_by_id() {
    let backend = FakeBackend::new().listing(
        5,
        Ok(json!({ "success": true, "data": { "id": 5, "name": "Cozy Flat" } })),
    );
    let state = cookie_state(backend.get_all(Ok(json!([]))));

    let found = send(&state, Method::GET, "/properties/5", &[], None);
    assert_eq!(found.status, 200);
    assert_eq!(found.body["title"], "Cozy Flat");

    let missing = send(&state, Method::GET, "/properties/77", &[], None);
    assert_eq!(missing.status, 404);

    let invalid = send(&state, Method::GET, "/properties/abc", &[], None);
    assert_eq!(invalid.status, 400);
}

#[test]
fn featured_and_recent_respect_limits() {
    let records: Vec<Value> = (1..=6)
        .map(|i| json!({ "id": i, "name": format!("Home {i}"), "createdAt": format!("2024-02-0{i}T00:00:00Z") }))
        .collect();
    let state = cookie_state(FakeBackend::new().get_all(Ok(Value::Array(records))));

    let featured = send(&state, Method::GET, "/properties/featured", &[], None);
    assert_eq!(featured.status, 200);
    assert_eq!(featured.body.as_array().unwrap().len(), 4);

    let recent = send(&state, Method::GET, "/properties/recent?limit=2", &[], None);
    let ids: Vec<i64> = recent
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![6, 5]);
}

#[test]
fn create_requires_a_token() {
    let backend = FakeBackend::new().mutation(Ok(json!({ "success": true })));
    let log = backend.call_log();
    let state = cookie_state(backend);

    let resp = send(
        &state,
        Method::POST,
        "/properties",
        &[],
        Some(json!({ "title": "Loft", "price": 1000 })),
    );

    assert_eq!(resp.status, 401);
    assert!(calls(&log).is_empty());
}

#[test]
fn create_forwards_bearer_and_payload() {
    let backend = FakeBackend::new().mutation(Ok(json!({
        "success": true,
        "data": { "id": 42, "name": "Loft", "listingType": "RENT" }
    })));
    let log = backend.call_log();
    let payloads = backend.payload_log();
    let state = cookie_state(backend);

    let resp = send(
        &state,
        Method::POST,
        "/properties",
        &[("Authorization", "Bearer tok-1")],
        Some(json!({ "title": "Loft", "price": 1000, "listingType": "rent", "amenities": ["Wifi", "Lift"] })),
    );

    assert_eq!(resp.status, 201);
    assert_eq!(resp.body["id"], 42);
    assert_eq!(calls(&log), vec!["create:tok-1"]);

    let sent = payloads.lock().unwrap()[0].clone();
    assert_eq!(sent.name, "Loft");
    assert_eq!(sent.listing_type, "RENT");
    assert_eq!(sent.amenities, "Wifi,Lift");
}

#[test]
fn status_update_and_delete() {
    let backend = FakeBackend::new().mutation(Ok(json!({ "success": true })));
    let log = backend.call_log();
    let state = cookie_state(backend);
    let auth = [("Cookie", "access_token=tok-2")];

    let resp = send(&state, Method::PUT, "/properties/9/status?status=sold", &auth, None);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["success"], true);

    let bad = send(&state, Method::PUT, "/properties/9/status?status=gone", &auth, None);
    assert_eq!(bad.status, 400);

    let resp = send(&state, Method::DELETE, "/properties/9", &auth, None);
    assert_eq!(resp.status, 200);

    assert_eq!(calls(&log), vec!["status:tok-2:9:SOLD", "delete:tok-2:9"]);
}

#[test]
fn malformed_body_is_a_bad_request() {
    let state = cookie_state(FakeBackend::new());
    let resp = send(
        &state,
        Method::PUT,
        "/properties/3",
        &[("Authorization", "Bearer tok")],
        Some(json!("not a listing")),
    );
    assert_eq!(resp.status, 400);
}

#[test]
fn unknown_routes_are_not_found() {
    let state = cookie_state(FakeBackend::new());
    let resp = send(&state, Method::GET, "/nope", &[], None);
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["success"], false);
}
