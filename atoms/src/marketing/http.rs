use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::PageState;
use super::page::render_page;

/// HTTP Handler: GET /
pub fn get_page() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(render_page(&PageState::default()).into())
        .map_err(Box::new)?)
}
