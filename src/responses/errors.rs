use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into a JSON error body with the matching status.
pub fn error_to_response(err: &ServerError) -> Response {
    let status = err.status();
    if status >= 500 {
        tracing::error!(status, error = %err, "Request failed");
    } else {
        tracing::debug!(status, error = %err, "Request rejected");
    }

    let body = json!({ "success": false, "message": err.to_string() }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
