use lambda_http::http::StatusCode;

use super::UpstreamResponse;
use crate::ports::ContractSource;
use crate::ApiError;

pub const UPSTREAM_FAILURE: &str = "Failed to fetch contract data";

/// Outcome of relaying a contract lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractRelay {
    /// Upstream JSON body, byte for byte.
    Json(Vec<u8>),
    /// Upstream answered with a non-success status, mirrored to the caller.
    Failed(StatusCode),
}

/// Fetch a contract from the workflow webhook.
pub async fn relay_contract(
    source: &dyn ContractSource,
    contract_id: &str,
) -> Result<ContractRelay, ApiError> {
    let contract_id = contract_id.trim();
    if contract_id.is_empty() {
        return Err(ApiError::bad_request("contractId is required"));
    }

    let UpstreamResponse { status, body } = source.fetch_contract(contract_id).await.map_err(|e| {
        tracing::error!("Contract webhook unreachable for {}: {}", contract_id, e);
        ApiError::from(e)
    })?;

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        tracing::warn!("Contract webhook returned {} for {}", status, contract_id);
        return Ok(ContractRelay::Failed(status));
    }

    if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
        tracing::error!("Contract webhook returned a non-JSON body for {}", contract_id);
        return Err(ApiError::Upstream(
            "Invalid response from contract service".to_string(),
        ));
    }

    Ok(ContractRelay::Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticContractSource;
    use rstest::rstest;

    #[tokio::test]
    async fn forwards_json_body_verbatim() {
        let body = br#"{"contract_id":"c-1","clauses":[1, 2]}"#.to_vec();
        let source = StaticContractSource::reply(200, body.clone());

        let relay = relay_contract(&source, "c-1").await.unwrap();

        assert_eq!(relay, ContractRelay::Json(body));
        assert_eq!(source.requested().await, vec!["c-1".to_string()]);
    }

    #[rstest]
    #[case(404)]
    #[case(429)]
    #[case(503)]
    #[tokio::test]
    async fn mirrors_upstream_status(#[case] status: u16) {
        let source = StaticContractSource::reply(status, b"<html>oops</html>".to_vec());
        let relay = relay_contract(&source, "c-1").await.unwrap();
        assert_eq!(relay, ContractRelay::Failed(StatusCode::from_u16(status).unwrap()));
    }

    #[tokio::test]
    async fn non_json_success_is_upstream_error() {
        let source = StaticContractSource::reply(200, b"not json".to_vec());
        let err = relay_contract(&source, "c-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_upstream_error() {
        let source = StaticContractSource::unreachable("connection refused");
        let err = relay_contract(&source, "c-1").await.unwrap_err();
        assert_eq!(err, ApiError::Upstream("connection refused".to_string()));
    }
}
