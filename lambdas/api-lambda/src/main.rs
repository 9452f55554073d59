use std::sync::Arc;

use clarence_shared::{AppState, Config};
use lambda_http::{run, service_fn, Error, Request};
use tracing_subscriber::EnvFilter;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Starting API Lambda (table {}, webhook {})",
        config.table_name,
        config.contract_webhook_url
    );

    let state = Arc::new(AppState::from_config(&config).await?);

    run(service_fn(move |event: Request| {
        let state = state.clone();
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
