pub mod cognito;
pub mod config;
pub mod cors;
pub mod dynamo;
pub mod email;
pub mod webhook;

use std::sync::Arc;

use clarence_atoms::ports::{
    CompanyStore, ContractSource, EmailSender, FeedbackStore, IdentityProvider, ProfileStore,
};

pub use config::{Config, ConfigError};

use cognito::CognitoIdentityProvider;
use dynamo::DynamoStore;
use email::SesEmailSender;
use webhook::WebhookContractSource;

/// Collaborators shared by every request, built once per cold start.
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub companies: Arc<dyn CompanyStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub email: Arc<dyn EmailSender>,
    pub contracts: Arc<dyn ContractSource>,
    pub email_from: String,
}

impl AppState {
    /// Wire the AWS and webhook adapters from `config`.
    ///
    /// # Errors
    ///
    /// Fails when the webhook HTTP client cannot be built.
    pub async fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let cognito_client = aws_sdk_cognitoidentityprovider::Client::new(&aws_config);
        let dynamo_client = aws_sdk_dynamodb::Client::new(&aws_config);
        let ses_client = aws_sdk_sesv2::Client::new(&aws_config);

        let store = Arc::new(DynamoStore::new(dynamo_client, &config.table_name));
        let contracts =
            WebhookContractSource::new(config.contract_webhook_url.clone(), config.webhook_timeout)?;

        Ok(AppState {
            identity: Arc::new(CognitoIdentityProvider::new(
                cognito_client,
                &config.cognito_user_pool_id,
            )),
            profiles: store.clone(),
            companies: store.clone(),
            feedback: store,
            email: Arc::new(SesEmailSender::new(ses_client)),
            contracts: Arc::new(contracts),
            email_from: config.email_from.clone(),
        })
    }
}
