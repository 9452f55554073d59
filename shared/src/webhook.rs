use std::time::Duration;

use async_trait::async_trait;
use clarence_atoms::contracts::UpstreamResponse;
use clarence_atoms::ports::{ContractSource, UpstreamError};
use reqwest::{header::ACCEPT, Client};
use url::Url;

/// Workflow webhook serving contract data at `{base}/{contractId}`.
pub struct WebhookContractSource {
    client: Client,
    base_url: Url,
}

impl WebhookContractSource {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(WebhookContractSource { client, base_url })
    }

    /// Append the id as one percent-encoded path segment.
    pub fn contract_url(&self, contract_id: &str) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Transport("webhook URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(contract_id);
        Ok(url)
    }
}

#[async_trait]
impl ContractSource for WebhookContractSource {
    async fn fetch_contract(&self, contract_id: &str) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.contract_url(contract_id)?;
        tracing::info!("Fetching contract {} from workflow webhook", contract_id);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://hooks.example.com/webhook/contract", "c-42", "https://hooks.example.com/webhook/contract/c-42")]
    #[case("https://hooks.example.com/webhook/contract/", "c-42", "https://hooks.example.com/webhook/contract/c-42")]
    #[case("https://hooks.example.com/webhook", "a/b c", "https://hooks.example.com/webhook/a%2Fb%20c")]
    fn builds_contract_url(#[case] base: &str, #[case] id: &str, #[case] expected: &str) {
        let source =
            WebhookContractSource::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap();
        assert_eq!(source.contract_url(id).unwrap().as_str(), expected);
    }
}
