use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateFeedbackPayload, UpdateFeedbackPayload};
use super::service;
use crate::ports::FeedbackStore;
use crate::response;

/// HTTP Handler: POST /feedback
pub async fn create_feedback(store: &dyn FeedbackStore, body: &Body) -> Result<Response<Body>, Error> {
    let payload: CreateFeedbackPayload = match response::parse_json(body) {
        Ok(payload) => payload,
        Err(e) => return response::api_error(&e),
    };

    match service::create_feedback(store, payload).await {
        Ok(feedback_id) => response::json(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "feedbackId": feedback_id }),
        ),
        Err(e) => response::api_error(&e),
    }
}

/// HTTP Handler: PATCH /feedback
pub async fn update_feedback(store: &dyn FeedbackStore, body: &Body) -> Result<Response<Body>, Error> {
    let payload: UpdateFeedbackPayload = match response::parse_json(body) {
        Ok(payload) => payload,
        Err(e) => return response::api_error(&e),
    };

    match service::update_feedback(store, payload).await {
        Ok(feedback) => response::json(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "feedback": feedback }),
        ),
        Err(e) => response::api_error(&e),
    }
}
