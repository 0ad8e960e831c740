use crate::auth::token::decode_claims;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use std::collections::HashMap;

pub const TOKEN_COOKIE: &str = "access_token";

/// All `name=value` pairs from every `Cookie` header. Later duplicates win.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

/// Token from `Authorization: Bearer …`.
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Token sent by the client: bearer header first, then the `access_token` cookie.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    bearer_from_headers(headers).or_else(|| {
        parse_cookies(headers)
            .remove(TOKEN_COOKIE)
            .filter(|t| !t.is_empty())
    })
}

/// `Set-Cookie` value storing `token`. A JWT's `exp` becomes the cookie lifetime.
pub fn token_cookie(token: &str, now: i64) -> String {
    let max_age = decode_claims(token)
        .and_then(|claims| claims.exp)
        .map(|exp| format!("; Max-Age={}", (exp - now).max(0)))
        .unwrap_or_default();

    format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax{max_age}")
}

/// `Set-Cookie` value that removes the token cookie.
pub fn expired_token_cookie() -> String {
    format!("{TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
