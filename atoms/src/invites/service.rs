use super::model::{OutgoingEmail, ProviderInvite, SentInvite};
use super::template::{invite_subject, render_invite_html};
use crate::ports::EmailSender;
use crate::ApiError;

/// Render the invitation and hand it to the email provider.
pub async fn send_provider_invite(
    sender: &dyn EmailSender,
    from: &str,
    invite: ProviderInvite,
) -> Result<SentInvite, ApiError> {
    let recipient = invite
        .provider_email
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let has_url = invite
        .invite_url
        .as_deref()
        .is_some_and(|v| !v.trim().is_empty());

    let Some(recipient) = recipient.filter(|_| has_url) else {
        return Err(ApiError::bad_request(
            "Missing required fields: providerEmail and inviteUrl",
        ));
    };

    let email = OutgoingEmail {
        from: from.to_string(),
        to: recipient.to_string(),
        subject: invite_subject(&invite),
        html: render_invite_html(&invite),
    };

    let message_id = sender.send_email(&email).await.map_err(|e| {
        tracing::error!("Failed to send provider invite to {}: {}", email.to, e);
        ApiError::from(e)
    })?;

    tracing::info!("Provider invite sent to {} ({})", email.to, message_id);
    Ok(SentInvite {
        message_id,
        recipient: email.to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEmailSender;

    const FROM: &str = "CLARENCE <noreply@clarence.test>";

    fn invite() -> ProviderInvite {
        ProviderInvite {
            provider_email: Some("provider@example.com".to_string()),
            customer_company: Some("Acme Ltd".to_string()),
            contract_title: Some("Facilities Management".to_string()),
            invite_url: Some("https://app.clarence.test/invite/xyz".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sends_rendered_invite() {
        let sender = RecordingEmailSender::default();
        let sent = send_provider_invite(&sender, FROM, invite()).await.unwrap();

        assert_eq!(sent.recipient, "provider@example.com");
        let outbox = sender.sent().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].from, FROM);
        assert_eq!(
            outbox[0].subject,
            "Acme Ltd has invited you to negotiate: Facilities Management"
        );
        assert!(outbox[0].html.contains("https://app.clarence.test/invite/xyz"));
    }

    #[tokio::test]
    async fn checks_required_fields_before_sending() {
        let sender = RecordingEmailSender::default();

        let no_url = ProviderInvite {
            invite_url: None,
            ..invite()
        };
        let no_recipient = ProviderInvite {
            provider_email: Some("  ".to_string()),
            ..invite()
        };
        for payload in [no_url, no_recipient] {
            let err = send_provider_invite(&sender, FROM, payload).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
        }
        assert!(sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_surfaces_message() {
        let sender = RecordingEmailSender::failing("Email address is not verified");
        let err = send_provider_invite(&sender, FROM, invite()).await.unwrap_err();
        assert_eq!(err, ApiError::Upstream("Email address is not verified".to_string()));
    }
}
