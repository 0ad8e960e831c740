use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAX_LOGGED_STRING: usize = 100;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_gateway=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Copy of `value` with inline image data and other long blobs cut short.
pub fn truncate_for_logging(value: &Value) -> Value {
    match value {
        Value::String(s) if looks_like_blob(s) => {
            let head: String = s.chars().take(MAX_LOGGED_STRING).collect();
            Value::String(format!("{head}... [truncated, {} chars]", s.chars().count()))
        }
        Value::Array(items) => Value::Array(items.iter().map(truncate_for_logging).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_for_logging(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn looks_like_blob(s: &str) -> bool {
    if s.starts_with("data:image") {
        return true;
    }
    s.len() > MAX_LOGGED_STRING * 10
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'))
}
