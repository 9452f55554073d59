use lambda_http::http::StatusCode;
use thiserror::Error;

use crate::ports::{AuthError, EmailError, StoreError, UpstreamError};

/// Request failure classes surfaced to API callers as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Missing or unresolvable credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Valid credentials without the required role.
    #[error("{0}")]
    Forbidden(String),
    /// Missing or malformed input, duplicates and unknown records.
    #[error("{0}")]
    BadRequest(String),
    /// A collaborating service failed; the provider message is surfaced.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid token".to_string()),
            AuthError::Provider(message) => ApiError::Upstream(message),
        }
    }
}
