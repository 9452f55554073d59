use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_TABLE_NAME: &str = "clarence";
pub const DEFAULT_EMAIL_FROM: &str = "CLARENCE <noreply@clarencelegal.ai>";
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime configuration, read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    pub cognito_user_pool_id: String,
    pub email_from: String,
    pub contract_webhook_url: Url,
    pub webhook_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cognito_user_pool_id =
            get("COGNITO_USER_POOL_ID").ok_or(ConfigError::Missing("COGNITO_USER_POOL_ID"))?;

        let raw_url =
            get("CONTRACT_WEBHOOK_URL").ok_or(ConfigError::Missing("CONTRACT_WEBHOOK_URL"))?;
        let contract_webhook_url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::Invalid {
            name: "CONTRACT_WEBHOOK_URL",
            reason: e.to_string(),
        })?;
        if contract_webhook_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: "CONTRACT_WEBHOOK_URL",
                reason: "must be an absolute http(s) URL".to_string(),
            });
        }

        let webhook_timeout = match get("WEBHOOK_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: "WEBHOOK_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?,
            None => Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
        };

        Ok(Config {
            table_name: get("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            cognito_user_pool_id,
            email_from: get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            contract_webhook_url,
            webhook_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("COGNITO_USER_POOL_ID", "eu-west-2_Example"),
        ("CONTRACT_WEBHOOK_URL", "https://workflows.example.com/webhook/contract"),
    ];

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        assert_eq!(config.email_from, DEFAULT_EMAIL_FROM);
        assert_eq!(config.webhook_timeout, Duration::from_secs(10));
        assert_eq!(
            config.contract_webhook_url.as_str(),
            "https://workflows.example.com/webhook/contract"
        );
    }

    #[test]
    fn reads_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("TABLE_NAME", "clarence-staging"),
            ("EMAIL_FROM", "Invites <invites@example.com>"),
            ("WEBHOOK_TIMEOUT_SECS", "3"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.table_name, "clarence-staging");
        assert_eq!(config.email_from, "Invites <invites@example.com>");
        assert_eq!(config.webhook_timeout, Duration::from_secs(3));
    }

    #[rstest]
    #[case("COGNITO_USER_POOL_ID")]
    #[case("CONTRACT_WEBHOOK_URL")]
    fn missing_required_variable(#[case] name: &'static str) {
        let vars: Vec<(&str, &str)> = REQUIRED.iter().copied().filter(|(k, _)| *k != name).collect();
        assert_eq!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing(name))
        );
    }

    #[rstest]
    #[case("CONTRACT_WEBHOOK_URL", "not a url")]
    #[case("CONTRACT_WEBHOOK_URL", "mailto:ops@example.com")]
    #[case("WEBHOOK_TIMEOUT_SECS", "soon")]
    fn invalid_values(#[case] name: &'static str, #[case] value: &str) {
        let mut vars: Vec<(&str, &str)> = REQUIRED.iter().copied().filter(|(k, _)| *k != name).collect();
        vars.push((name, value));
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: n, .. }) if n == name
        ));
    }
}
