// src/auth/token.rs
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Payload fields the backend puts in its access tokens. All optional; unknown fields ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Claims {
    pub sub: Option<String>,
    pub id: Option<i64>,
    pub role: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

/// Three dot-separated, non-empty segments.
pub fn looks_like_jwt(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty())
}

/// Decode the payload segment without verifying the signature. The gateway only reads
/// `exp`; the backend is the one that trusts the token.
pub fn decode_claims(token: &str) -> Option<Claims> {
    if !looks_like_jwt(token) {
        return None;
    }
    let payload = token.split('.').nth(1)?.trim_end_matches('=');

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(payload))
        .ok()?;

    serde_json::from_slice(&bytes).ok()
}

/// True when the token carries an `exp` at or before `now` (unix seconds).
pub fn is_expired(token: &str, now: i64) -> bool {
    decode_claims(token)
        .and_then(|claims| claims.exp)
        .is_some_and(|exp| exp <= now)
}

/// The token, unless it is a JWT that has already expired. Opaque tokens pass through.
pub fn usable_bearer(token: &str, now: i64) -> Option<&str> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if is_expired(token, now) {
        tracing::info!(token = %token_fingerprint(token), "Dropping expired access token");
        return None;
    }
    Some(token)
}

/// Short SHA-256 fingerprint for logs. Raw tokens are never logged.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
pub(crate) fn make_jwt(payload: &serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.{}",
        engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(payload.to_string()),
        engine.encode(b"signature")
    )
}
