use std::sync::Arc;

use clarence_atoms::feedback::FeedbackParams;
use clarence_atoms::{contracts, feedback, invites, marketing, response, users};
use clarence_shared::{cors::with_cors_headers, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use percent_encoding::percent_decode_str;

fn not_found() -> Result<Response<Body>, Error> {
    response::error(StatusCode::NOT_FOUND, "Not found")
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn route(event: &Request, state: &AppState) -> Result<Response<Body>, Error> {
    let method = event.method();
    let body = event.body();
    let authorization = event
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());
    let parts: Vec<&str> = event
        .uri()
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (parts.as_slice(), method) {
        ([], &Method::GET) => marketing::http::get_page(),

        (["admin", "create-user"], &Method::POST) => {
            users::http::create_user(
                state.identity.as_ref(),
                state.profiles.as_ref(),
                state.companies.as_ref(),
                authorization,
                body,
            )
            .await
        }
        (["admin", "create-user"], &Method::DELETE) => {
            users::http::delete_user(
                state.identity.as_ref(),
                state.profiles.as_ref(),
                authorization,
                body,
            )
            .await
        }

        (["feedback"], &Method::POST) => {
            feedback::http::create_feedback(state.feedback.as_ref(), body).await
        }
        (["feedback"], &Method::GET) => {
            let query = event.query_string_parameters_ref();
            let param = |name: &str| query.and_then(|q| q.first(name));
            feedback_block::list_feedback(
                state.feedback.as_ref(),
                state.profiles.as_ref(),
                state.companies.as_ref(),
                FeedbackParams {
                    status: param("status"),
                    feedback_type: param("type"),
                    user_id: param("user_id"),
                    limit: param("limit"),
                    offset: param("offset"),
                },
            )
            .await
        }
        (["feedback"], &Method::PATCH) => {
            feedback::http::update_feedback(state.feedback.as_ref(), body).await
        }

        (["email", "send-provider-invite"], &Method::POST) => {
            invites::http::send_invite(state.email.as_ref(), &state.email_from, body).await
        }

        (["contracts", raw_id], &Method::GET) => {
            // The path is still percent-encoded; the webhook source encodes again.
            match percent_decode_str(raw_id).decode_utf8() {
                Ok(contract_id) => {
                    contracts::http::get_contract(state.contracts.as_ref(), &contract_id).await
                }
                Err(_) => response::error(StatusCode::BAD_REQUEST, "Invalid contractId"),
            }
        }

        ([], _)
        | (["admin", "create-user"], _)
        | (["feedback"], _)
        | (["email", "send-provider-invite"], _)
        | (["contracts", _], _) => method_not_allowed(),

        _ => not_found(),
    }
}

/// Main Lambda handler: CORS preflight, routing, and a last-resort 500.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    tracing::info!(
        "API Lambda invoked - Method: {} Path: {}",
        event.method(),
        event.uri().path()
    );

    if event.method() == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let resp = match route(&event, &state).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!("Unhandled error for {}: {}", event.uri().path(), e);
            response::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())?
        }
    };

    Ok(with_cors_headers(resp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarence_atoms::testing::{
        InMemoryIdentityProvider, InMemoryStore, RecordingEmailSender, StaticContractSource,
    };
    use clarence_atoms::users::{Profile, UserRole};
    use lambda_http::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    struct Harness {
        state: Arc<AppState>,
        identity: Arc<InMemoryIdentityProvider>,
        store: Arc<InMemoryStore>,
        email: Arc<RecordingEmailSender>,
        contracts: Arc<StaticContractSource>,
    }

    fn harness_with(contracts: StaticContractSource) -> Harness {
        let identity = Arc::new(InMemoryIdentityProvider::default());
        let store = Arc::new(InMemoryStore::default());
        let email = Arc::new(RecordingEmailSender::default());
        let contracts = Arc::new(contracts);
        let state = Arc::new(AppState {
            identity: identity.clone(),
            profiles: store.clone(),
            companies: store.clone(),
            feedback: store.clone(),
            email: email.clone(),
            contracts: contracts.clone(),
            email_from: "CLARENCE <noreply@clarence.test>".to_string(),
        });
        Harness {
            state,
            identity,
            store,
            email,
            contracts,
        }
    }

    fn harness() -> Harness {
        harness_with(StaticContractSource::reply(200, b"{}".to_vec()))
    }

    impl Harness {
        async fn add_user(&self, email: &str, token: &str, role: UserRole) -> String {
            let user_id = self.identity.add_identity(email, token).await;
            self.store
                .put_profile(Profile {
                    user_id: user_id.clone(),
                    email: email.to_string(),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    role,
                    company_id: None,
                    is_beta_tester: false,
                    created_at: "2026-01-01T00:00:00+00:00".to_string(),
                })
                .await;
            user_id
        }

        async fn send(&self, request: Request) -> Response<Body> {
            function_handler(request, self.state.clone()).await.unwrap()
        }
    }

    fn request(method: &str, path: &str, body: Option<Value>) -> Request {
        let body = body.map_or(Body::Empty, |b| Body::from(b.to_string()));
        lambda_http::http::Request::builder()
            .method(method)
            .uri(path)
            .body(body)
            .unwrap()
    }

    fn admin_request(method: &str, token: &str, body: Value) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri("/admin/create-user")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_body(resp: &Response<Body>) -> Value {
        serde_json::from_str(response::body_text(resp.body())).unwrap()
    }

    fn allows_any_origin(resp: &Response<Body>) -> bool {
        resp.headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_some_and(|v| v == "*")
    }

    #[tokio::test]
    async fn preflight_on_any_path() {
        let h = harness();
        let resp = h.send(request("OPTIONS", "/does/not/exist", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(allows_any_origin(&resp));
    }

    #[tokio::test]
    async fn unknown_path_and_wrong_method() {
        let h = harness();

        let resp = h.send(request("GET", "/nope", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(allows_any_origin(&resp));

        let resp = h.send(request("PUT", "/feedback", None)).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json_body(&resp)["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn serves_marketing_page() {
        let h = harness();
        let resp = h.send(request("GET", "/", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(response::body_text(resp.body()).contains("how-it-works"));
        assert!(allows_any_origin(&resp));
    }

    #[tokio::test]
    async fn admin_creates_and_deletes_user() {
        let h = harness();
        h.add_user("admin@clarence.test", "admin-token", UserRole::Admin)
            .await;

        let resp = h
            .send(admin_request(
                "POST",
                "admin-token",
                json!({
                    "email": " New.User@Example.com ",
                    "password": "correct horse",
                    "firstName": "New",
                    "lastName": "User",
                    "companyName": "Acme Ltd"
                }),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(&resp);
        assert_eq!(body["success"], true);
        assert_eq!(body["email"], "new.user@example.com");
        assert_eq!(h.store.company_count().await, 1);

        let user_id = body["userId"].as_str().unwrap().to_string();
        assert!(h.identity.has_identity(&user_id).await);

        let resp = h
            .send(admin_request("DELETE", "admin-token", json!({ "userId": user_id })))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!h.identity.has_identity(&user_id).await);
    }

    #[tokio::test]
    async fn admin_routes_check_the_caller() {
        let h = harness();
        h.add_user("member@clarence.test", "member-token", UserRole::User)
            .await;

        let resp = h
            .send(request("POST", "/admin/create-user", Some(json!({}))))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = h
            .send(admin_request("POST", "member-token", json!({})))
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(&resp)["error"], "Admin access required");
    }

    #[tokio::test]
    async fn feedback_round_trip_through_the_router() {
        let h = harness();
        let user_id = h
            .add_user("ada@example.com", "ada-token", UserRole::User)
            .await;

        for i in 0..3 {
            let resp = h
                .send(request(
                    "POST",
                    "/feedback",
                    Some(json!({
                        "user_id": user_id,
                        "feedback_type": "bug",
                        "description": format!("issue {}", i),
                    })),
                ))
                .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let list = request("GET", "/feedback", None).with_query_string_parameters(
            HashMap::from([
                ("type".to_string(), "bug".to_string()),
                ("limit".to_string(), "2".to_string()),
            ]),
        );
        let resp = h.send(list).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(&resp);
        assert_eq!(body["total"], 3);
        assert_eq!(body["limit"], 2);
        assert_eq!(body["feedback"].as_array().unwrap().len(), 2);
        assert_eq!(body["feedback"][0]["user"]["email"], "ada@example.com");

        let feedback_id = body["feedback"][0]["feedback_id"].as_str().unwrap().to_string();
        let resp = h
            .send(request(
                "PATCH",
                "/feedback",
                Some(json!({ "feedback_id": feedback_id, "status": "resolved" })),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(&resp)["feedback"]["status"], "resolved");
    }

    #[tokio::test]
    async fn bad_feedback_query_is_rejected() {
        let h = harness();
        let list = request("GET", "/feedback", None).with_query_string_parameters(
            HashMap::from([("limit".to_string(), "lots".to_string())]),
        );
        let resp = h.send(list).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sends_provider_invite() {
        let h = harness();
        let resp = h
            .send(request(
                "POST",
                "/email/send-provider-invite",
                Some(json!({
                    "providerEmail": "provider@example.com",
                    "inviteUrl": "https://app.clarence.test/invite/abc",
                    "customerCompany": "Acme Ltd",
                    "contractTitle": "Cleaning",
                    "dealValue": 1000
                })),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(&resp)["recipient"], "provider@example.com");

        let sent = h.email.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "CLARENCE <noreply@clarence.test>");
        assert!(sent[0].html.contains("£1,000"));
    }

    #[tokio::test]
    async fn relays_contract_json_verbatim() {
        let h = harness_with(StaticContractSource::reply(
            200,
            br#"{"contractId":"c-1","title":"Cleaning"}"#.to_vec(),
        ));
        let resp = h.send(request("GET", "/contracts/c-1", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(&resp)["title"], "Cleaning");
        assert!(allows_any_origin(&resp));
    }

    #[tokio::test]
    async fn mirrors_upstream_failure_status() {
        let h = harness_with(StaticContractSource::reply(404, b"no such contract".to_vec()));
        let resp = h.send(request("GET", "/contracts/missing", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(&resp)["error"], "Failed to fetch contract data");
    }

    #[tokio::test]
    async fn decodes_contract_id_once() {
        let h = harness();
        let resp = h.send(request("GET", "/contracts/a%20b%2Fc", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(h.contracts.requested().await, vec!["a b/c".to_string()]);
    }

    #[tokio::test]
    async fn rejects_contract_id_that_is_not_utf8() {
        let h = harness();
        let resp = h.send(request("GET", "/contracts/%FF", None)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(h.contracts.requested().await.is_empty());
    }
}
