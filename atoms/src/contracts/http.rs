use lambda_http::{http::StatusCode, Body, Error, Response};

use super::service::{relay_contract, ContractRelay, UPSTREAM_FAILURE};
use crate::ports::ContractSource;
use crate::response;

/// HTTP Handler: GET /contracts/{contractId}
pub async fn get_contract(
    source: &dyn ContractSource,
    contract_id: &str,
) -> Result<Response<Body>, Error> {
    match relay_contract(source, contract_id).await {
        Ok(ContractRelay::Json(body)) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Body::Binary(body))
            .map_err(Box::new)?),
        // Same body whatever the upstream cause.
        Ok(ContractRelay::Failed(status)) => response::error(status, UPSTREAM_FAILURE),
        Err(e) => response::api_error(&e),
    }
}
