use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use crate::ApiError;

/// JSON response with the given status.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(body)?.into())
        .map_err(Box::new)?)
}

/// `{"error": message}` with the given status.
pub fn error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json(status, &serde_json::json!({ "error": message }))
}

pub fn api_error(err: &ApiError) -> Result<Response<Body>, Error> {
    error(err.status(), &err.to_string())
}

/// Request body as text; binary bodies must be UTF-8.
pub fn body_text(body: &Body) -> &str {
    match body {
        Body::Text(text) => text,
        Body::Binary(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
        Body::Empty => "",
    }
}

/// Parse a JSON request body, mapping failures to a 400.
pub fn parse_json<'a, T: serde::Deserialize<'a>>(body: &'a Body) -> Result<T, ApiError> {
    serde_json::from_str(body_text(body))
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}
