use async_trait::async_trait;
use aws_sdk_sesv2::{
    error::{DisplayErrorContext, ProvideErrorMetadata},
    types::{Body as EmailBody, Content, Destination, EmailContent, Message},
    Client as SesClient,
};
use clarence_atoms::invites::OutgoingEmail;
use clarence_atoms::ports::{EmailError, EmailSender};

/// SES v2 as the transactional email API.
pub struct SesEmailSender {
    client: SesClient,
}

impl SesEmailSender {
    pub fn new(client: SesClient) -> Self {
        SesEmailSender { client }
    }
}

fn utf8(data: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError(e.to_string()))
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send_email(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let message = Message::builder()
            .subject(utf8(&email.subject)?)
            .body(EmailBody::builder().html(utf8(&email.html)?).build())
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&email.from)
            .destination(Destination::builder().to_addresses(&email.to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("SES send_email error: {}", DisplayErrorContext(&e));
                EmailError(
                    e.as_service_error()
                        .and_then(|se| se.message())
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string()),
                )
            })?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}
