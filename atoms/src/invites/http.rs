use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::ProviderInvite;
use super::service::send_provider_invite;
use crate::ports::EmailSender;
use crate::response;

/// HTTP Handler: POST /email/send-provider-invite
pub async fn send_invite(
    sender: &dyn EmailSender,
    from: &str,
    body: &Body,
) -> Result<Response<Body>, Error> {
    let invite: ProviderInvite = match response::parse_json(body) {
        Ok(invite) => invite,
        Err(e) => return response::api_error(&e),
    };

    match send_provider_invite(sender, from, invite).await {
        Ok(sent) => response::json(
            StatusCode::OK,
            &serde_json::json!({
                "success": true,
                "messageId": sent.message_id,
                "recipient": sent.recipient,
            }),
        ),
        Err(e) => response::api_error(&e),
    }
}
