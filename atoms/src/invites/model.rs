use serde::{Deserialize, Deserializer, Serialize};

/// Invitation asking a provider to join a contract negotiation.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInvite {
    pub provider_email: Option<String>,
    pub provider_name: Option<String>,
    pub provider_company: Option<String>,
    pub customer_name: Option<String>,
    pub customer_company: Option<String>,
    pub contract_title: Option<String>,
    pub service_description: Option<String>,
    /// Accepted as a JSON string or number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub deal_value: Option<String>,
    pub invite_url: Option<String>,
    /// Correlates the email with a negotiation session.
    pub invite_token: Option<String>,
    pub personal_message: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "dealValue must be a string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SentInvite {
    pub message_id: String,
    pub recipient: String,
}
