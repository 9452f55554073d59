use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateUserPayload, DeleteUserPayload};
use super::service::{provision_user, remove_user, require_admin};
use crate::ports::{CompanyStore, IdentityProvider, ProfileStore};
use crate::response;

/// HTTP Handler: POST /admin/create-user
pub async fn create_user(
    identity: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    companies: &dyn CompanyStore,
    authorization: Option<&str>,
    body: &Body,
) -> Result<Response<Body>, Error> {
    if let Err(e) = require_admin(identity, profiles, authorization).await {
        return response::api_error(&e);
    }

    let payload: CreateUserPayload = match response::parse_json(body) {
        Ok(payload) => payload,
        Err(e) => return response::api_error(&e),
    };

    match provision_user(identity, profiles, companies, payload).await {
        Ok(created) => response::json(
            StatusCode::OK,
            &serde_json::json!({
                "success": true,
                "userId": created.user_id,
                "email": created.email,
            }),
        ),
        Err(e) => response::api_error(&e),
    }
}

/// HTTP Handler: DELETE /admin/create-user
pub async fn delete_user(
    identity: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    authorization: Option<&str>,
    body: &Body,
) -> Result<Response<Body>, Error> {
    if let Err(e) = require_admin(identity, profiles, authorization).await {
        return response::api_error(&e);
    }

    let payload: DeleteUserPayload = match response::parse_json(body) {
        Ok(payload) => payload,
        Err(e) => return response::api_error(&e),
    };

    match remove_user(identity, profiles, payload.user_id.as_deref()).await {
        Ok(()) => response::json(StatusCode::OK, &serde_json::json!({ "success": true })),
        Err(e) => response::api_error(&e),
    }
}
