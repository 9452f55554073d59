use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{AttributeType, MessageActionType},
    Client as CognitoClient,
};
use clarence_atoms::ports::{AuthError, IdentityProvider};
use clarence_atoms::users::NewIdentity;

/// Cognito user pool as the auth store.
pub struct CognitoIdentityProvider {
    client: CognitoClient,
    user_pool_id: String,
}

impl CognitoIdentityProvider {
    pub fn new(client: CognitoClient, user_pool_id: impl Into<String>) -> Self {
        CognitoIdentityProvider {
            client,
            user_pool_id: user_pool_id.into(),
        }
    }
}

/// The provider's own message when it sent one, the full error chain otherwise.
fn provider_message<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    err.as_service_error()
        .and_then(|e| e.message())
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(err).to_string())
}

fn attribute(name: &str, value: &str) -> Result<AttributeType, AuthError> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(|e| AuthError::Provider(e.to_string()))
}

fn sub_attribute(attributes: &[AttributeType]) -> Option<String> {
    attributes
        .iter()
        .find(|a| a.name() == "sub")
        .and_then(|a| a.value())
        .map(str::to_string)
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn resolve_token(&self, token: &str) -> Result<String, AuthError> {
        match self.client.get_user().access_token(token).send().await {
            Ok(output) => Ok(sub_attribute(output.user_attributes())
                .unwrap_or_else(|| output.username().to_string())),
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_not_authorized_exception() || se.is_user_not_found_exception() => {
                    Err(AuthError::InvalidToken)
                }
                _ => {
                    tracing::error!("Cognito get_user error: {}", DisplayErrorContext(&e));
                    Err(AuthError::Provider(provider_message(&e)))
                }
            },
        }
    }

    async fn create_identity(&self, identity: &NewIdentity) -> Result<String, AuthError> {
        // Email is the username; invitation email suppressed, address pre-confirmed.
        let created = self
            .client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(&identity.email)
            .user_attributes(attribute("email", &identity.email)?)
            .user_attributes(attribute("email_verified", "true")?)
            .user_attributes(attribute("given_name", &identity.first_name)?)
            .user_attributes(attribute("family_name", &identity.last_name)?)
            .message_action(MessageActionType::Suppress)
            .send()
            .await
            .map_err(|e| AuthError::Provider(provider_message(&e)))?;

        let user_id = created
            .user()
            .and_then(|u| sub_attribute(u.attributes()).or_else(|| u.username().map(str::to_string)))
            .ok_or_else(|| AuthError::Provider("Cognito returned no user id".to_string()))?;

        // AdminCreateUser leaves a temporary password; make ours permanent.
        if let Err(e) = self
            .client
            .admin_set_user_password()
            .user_pool_id(&self.user_pool_id)
            .username(&identity.email)
            .password(&identity.password)
            .permanent(true)
            .send()
            .await
        {
            let message = provider_message(&e);
            if let Err(cleanup) = self.delete_identity(&user_id).await {
                tracing::error!("Failed to remove half-created identity {}: {}", user_id, cleanup);
            }
            return Err(AuthError::Provider(message));
        }

        Ok(user_id)
    }

    async fn delete_identity(&self, user_id: &str) -> Result<(), AuthError> {
        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(user_id)
            .send()
            .await
            .map_err(|e| AuthError::Provider(provider_message(&e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sub_attribute() {
        let attributes = vec![
            attribute("email", "ada@example.com").unwrap(),
            attribute("sub", "0f1e2d3c").unwrap(),
        ];
        assert_eq!(sub_attribute(&attributes).as_deref(), Some("0f1e2d3c"));
        assert_eq!(sub_attribute(&attributes[..1]), None);
    }
}
