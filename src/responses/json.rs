use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};
use serde::Serialize;
use serde_json::json;

pub fn json_response<T: Serialize>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_string(value).map_err(|e| {
        tracing::error!(error = %e, "Response serialization failed");
        ServerError::InternalError
    })?;

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}

/// `{ "success": ..., "message": ... }`
pub fn message_response(status: u16, success: bool, message: &str) -> ResultResp {
    json_response(status, &json!({ "success": success, "message": message }))
}
