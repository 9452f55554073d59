//! Collaborator traits the atoms are written against.
//!
//! Every handler receives its collaborators as arguments; the AWS and HTTP
//! implementations live in `clarence-shared`, in-memory ones in
//! [`crate::testing`].

use async_trait::async_trait;
use thiserror::Error;

use crate::companies::Company;
use crate::contracts::UpstreamResponse;
use crate::feedback::{Feedback, FeedbackFilter, FeedbackUpdate};
use crate::invites::OutgoingEmail;
use crate::users::{NewIdentity, Profile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The bearer token is unknown, expired or revoked.
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EmailError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Transport(String),
}

/// Managed auth service holding user identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the identity's user id.
    async fn resolve_token(&self, token: &str) -> Result<String, AuthError>;

    /// Create a pre-confirmed identity and return its user id.
    async fn create_identity(&self, identity: &NewIdentity) -> Result<String, AuthError>;

    async fn delete_identity(&self, user_id: &str) -> Result<(), AuthError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError>;

    /// Load the profiles that exist among `user_ids`, in no particular order.
    async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError>;

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn delete_profile(&self, user_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError>;

    /// Insert `company` unless one with the same name exists. Returns the
    /// stored record, which is the earlier one when the name was taken.
    async fn insert_company(&self, company: &Company) -> Result<Company, StoreError>;

    async fn get_companies(&self, company_ids: &[String]) -> Result<Vec<Company>, StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError>;

    /// All feedback rows matching `filter`, unordered and unpaged.
    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, StoreError>;

    /// Apply `update` to an existing row. `Ok(None)` when the row does not exist.
    async fn update_feedback(
        &self,
        feedback_id: &str,
        update: &FeedbackUpdate,
        updated_at: &str,
    ) -> Result<Option<Feedback>, StoreError>;
}

/// Transactional email API.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send the email and return the provider's message id.
    async fn send_email(&self, email: &OutgoingEmail) -> Result<String, EmailError>;
}

/// External workflow webhook serving contract data.
#[async_trait]
pub trait ContractSource: Send + Sync {
    async fn fetch_contract(&self, contract_id: &str) -> Result<UpstreamResponse, UpstreamError>;
}
