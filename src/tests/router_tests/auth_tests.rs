use super::{cookie_state, local_state, send};
use crate::api::ApiError;
use crate::auth::token::make_jwt;
use crate::auth::{LocalTokenStore, TokenProvider};
use crate::tests::utils::{calls, init_test_db, FakeBackend};
use http::Method;
use serde_json::json;

fn credentials() -> serde_json::Value {
    json!({ "email": "ana@example.com", "password": "hunter2" })
}

#[test]
fn login_sets_the_token_cookie() {
    let token = make_jwt(&json!({ "sub": "ana@example.com", "exp": 4_102_444_800i64 }));
    let backend = FakeBackend::new().login(Ok(json!({
        "success": true,
        "data": { "cookie": { "name": "access_token", "value": token } }
    })));
    let log = backend.call_log();
    let state = cookie_state(backend);

    let resp = send(&state, Method::POST, "/auth/login", &[], Some(credentials()));

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["success"], true);
    let cookie = resp.set_cookie.expect("login should set a cookie");
    assert!(cookie.starts_with(&format!("access_token={token};")));
    assert!(cookie.contains("HttpOnly"));
    assert_eq!(calls(&log), vec!["login:ana@example.com"]);
}

#[test]
fn failed_login_is_unauthorized() {
    let state = cookie_state(
        FakeBackend::new().login(Ok(json!({ "success": false, "message": "Invalid credentials" }))),
    );
    let resp = send(&state, Method::POST, "/auth/login", &[], Some(credentials()));

    assert_eq!(resp.status, 401);
    assert_eq!(resp.body["success"], false);
}

#[test]
fn logout_expires_the_cookie() {
    let state = cookie_state(FakeBackend::new());
    let resp = send(
        &state,
        Method::POST,
        "/auth/logout",
        &[("Cookie", "access_token=tok")],
        None,
    );

    assert_eq!(resp.status, 200);
    assert!(resp.set_cookie.unwrap().contains("Max-Age=0"));
}

#[test]
fn rejected_token_is_cleared() {
    let state = cookie_state(FakeBackend::new().user(Err(ApiError::Unauthorized { status: 401 })));
    let resp = send(
        &state,
        Method::GET,
        "/properties/mine",
        &[("Cookie", "access_token=stale")],
        None,
    );

    assert_eq!(resp.status, 401);
    assert!(resp.set_cookie.unwrap().contains("Max-Age=0"));
}

#[test]
fn my_listings_without_a_token_are_empty() {
    let backend = FakeBackend::new();
    let log = backend.call_log();
    let state = cookie_state(backend);

    let resp = send(&state, Method::GET, "/properties/mine", &[], None);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["totalElements"], 0);
    assert!(calls(&log).is_empty());
}

#[test]
fn expired_jwt_is_never_forwarded() {
    let expired = make_jwt(&json!({ "exp": 1 }));
    let backend = FakeBackend::new().user(Ok(json!([])));
    let log = backend.call_log();
    let state = cookie_state(backend);

    let cookie = format!("access_token={expired}");
    let resp = send(&state, Method::GET, "/properties/mine", &[("Cookie", cookie.as_str())], None);

    assert_eq!(resp.status, 200);
    assert!(calls(&log).is_empty());
}

#[test]
fn local_store_keeps_the_token_between_requests() {
    let db = init_test_db();
    let store = LocalTokenStore::new(db.clone());
    let backend = FakeBackend::new()
        .login(Ok(json!({ "success": true, "accessToken": "local-tok" })))
        .user(Ok(json!([{ "id": 1, "name": "Mine" }])));
    let log = backend.call_log();
    let state = local_state(backend, store);

    let login = send(&state, Method::POST, "/auth/login", &[], Some(credentials()));
    assert_eq!(login.status, 200);
    assert_eq!(
        LocalTokenStore::new(db.clone()).get_token().as_deref(),
        Some("local-tok")
    );

    // No cookie on this request: the gateway-held token is used.
    let mine = send(&state, Method::GET, "/properties/mine", &[], None);
    assert_eq!(mine.body["totalElements"], 1);
    assert_eq!(calls(&log), vec!["login:ana@example.com", "user:local-tok"]);

    send(&state, Method::POST, "/auth/logout", &[], None);
    assert_eq!(LocalTokenStore::new(db).get_token(), None);
}

#[test]
fn local_store_never_adopts_a_client_cookie() {
    let store = LocalTokenStore::new(init_test_db());
    let backend = FakeBackend::new().user(Ok(json!([{ "id": 1, "name": "Alice's" }])));
    let log = backend.call_log();
    let state = local_state(backend, store.clone());

    let alice = send(
        &state,
        Method::GET,
        "/properties/mine",
        &[("Cookie", "access_token=alice-tok")],
        None,
    );
    assert_eq!(alice.body["totalElements"], 1);
    assert_eq!(store.get_token(), None);

    let anonymous = send(&state, Method::GET, "/properties/mine", &[], None);
    assert_eq!(anonymous.status, 200);
    assert_eq!(anonymous.body["totalElements"], 0);
    assert_eq!(calls(&log), vec!["user:alice-tok"]);
}
