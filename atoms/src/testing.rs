//! In-memory implementations of every port, for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::companies::Company;
use crate::contracts::UpstreamResponse;
use crate::feedback::{Feedback, FeedbackFilter, FeedbackUpdate};
use crate::invites::OutgoingEmail;
use crate::ports::{
    AuthError, CompanyStore, ContractSource, EmailError, EmailSender, FeedbackStore,
    IdentityProvider, ProfileStore, StoreError, UpstreamError,
};
use crate::users::{NewIdentity, Profile};

#[derive(Default)]
struct IdentityState {
    identities: HashMap<String, String>,
    tokens: HashMap<String, String>,
    create_failure: Option<String>,
    fail_deletes: bool,
    next_id: u32,
}

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<IdentityState>,
}

impl InMemoryIdentityProvider {
    /// Register an identity reachable through `token`. Returns its user id.
    pub async fn add_identity(&self, email: &str, token: &str) -> String {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let user_id = format!("user-{}", state.next_id);
        state.identities.insert(user_id.clone(), email.to_string());
        state.tokens.insert(token.to_string(), user_id.clone());
        user_id
    }

    pub async fn has_identity(&self, user_id: &str) -> bool {
        self.state.lock().await.identities.contains_key(user_id)
    }

    pub async fn identity_count(&self) -> usize {
        self.state.lock().await.identities.len()
    }

    /// Make every following `create_identity` fail with `message`.
    pub async fn fail_creates(&self, message: &str) {
        self.state.lock().await.create_failure = Some(message.to_string());
    }

    pub async fn fail_deletes(&self, fail: bool) {
        self.state.lock().await.fail_deletes = fail;
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn resolve_token(&self, token: &str) -> Result<String, AuthError> {
        let state = self.state.lock().await;
        state
            .tokens
            .get(token)
            .filter(|id| state.identities.contains_key(*id))
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }

    async fn create_identity(&self, identity: &NewIdentity) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        if let Some(message) = &state.create_failure {
            return Err(AuthError::Provider(message.clone()));
        }
        if state.identities.values().any(|email| *email == identity.email) {
            return Err(AuthError::Provider(
                "An account with the given email already exists.".to_string(),
            ));
        }
        state.next_id += 1;
        let user_id = format!("user-{}", state.next_id);
        state.identities.insert(user_id.clone(), identity.email.clone());
        Ok(user_id)
    }

    async fn delete_identity(&self, user_id: &str) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        if state.fail_deletes {
            return Err(AuthError::Provider("identity service unavailable".to_string()));
        }
        match state.identities.remove(user_id) {
            Some(_) => {
                state.tokens.retain(|_, id| id.as_str() != user_id);
                Ok(())
            }
            None => Err(AuthError::Provider("User does not exist.".to_string())),
        }
    }
}

#[derive(Default)]
struct StoreState {
    profiles: HashMap<String, Profile>,
    companies: Vec<Company>,
    feedback: HashMap<String, Feedback>,
    fail_profile_inserts: bool,
    fail_profile_deletes: bool,
    fail_company_writes: bool,
}

/// Profiles, companies and feedback in one place, like the single table.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub async fn put_profile(&self, profile: Profile) {
        self.state
            .lock()
            .await
            .profiles
            .insert(profile.user_id.clone(), profile);
    }

    pub async fn put_company(&self, company: Company) {
        self.state.lock().await.companies.push(company);
    }

    pub async fn put_feedback(&self, feedback: Feedback) {
        self.state
            .lock()
            .await
            .feedback
            .insert(feedback.feedback_id.clone(), feedback);
    }

    pub async fn feedback(&self, feedback_id: &str) -> Option<Feedback> {
        self.state.lock().await.feedback.get(feedback_id).cloned()
    }

    pub async fn feedback_count(&self) -> usize {
        self.state.lock().await.feedback.len()
    }

    pub async fn company_count(&self) -> usize {
        self.state.lock().await.companies.len()
    }

    pub async fn fail_profile_inserts(&self, fail: bool) {
        self.state.lock().await.fail_profile_inserts = fail;
    }

    pub async fn fail_profile_deletes(&self, fail: bool) {
        self.state.lock().await.fail_profile_deletes = fail;
    }

    pub async fn fail_company_writes(&self, fail: bool) {
        self.state.lock().await.fail_company_writes = fail;
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.state.lock().await.profiles.get(user_id).cloned())
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .profiles
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError> {
        let state = self.state.lock().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_profile_inserts {
            return Err(StoreError::Query("profile table unavailable".to_string()));
        }
        state.profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_profile_deletes {
            return Err(StoreError::Query("profile table unavailable".to_string()));
        }
        state.profiles.remove(user_id);
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for InMemoryStore {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let state = self.state.lock().await;
        if state.fail_company_writes {
            return Err(StoreError::Query("company table unavailable".to_string()));
        }
        Ok(state.companies.iter().find(|c| c.company_name == name).cloned())
    }

    async fn insert_company(&self, company: &Company) -> Result<Company, StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_company_writes {
            return Err(StoreError::Query("company table unavailable".to_string()));
        }
        if let Some(existing) = state
            .companies
            .iter()
            .find(|c| c.company_name == company.company_name)
        {
            return Ok(existing.clone());
        }
        state.companies.push(company.clone());
        Ok(company.clone())
    }

    async fn get_companies(&self, company_ids: &[String]) -> Result<Vec<Company>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .companies
            .iter()
            .filter(|c| company_ids.contains(&c.company_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.put_feedback(feedback.clone()).await;
        Ok(())
    }

    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .feedback
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect())
    }

    async fn update_feedback(
        &self,
        feedback_id: &str,
        update: &FeedbackUpdate,
        updated_at: &str,
    ) -> Result<Option<Feedback>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.feedback.get_mut(feedback_id).map(|feedback| {
            update.apply_to(feedback, updated_at);
            feedback.clone()
        }))
    }
}

/// Keeps every email it is asked to send.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Option<String>,
}

impl RecordingEmailSender {
    pub fn failing(message: &str) -> Self {
        RecordingEmailSender {
            sent: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        if let Some(message) = &self.failure {
            return Err(EmailError(message.clone()));
        }
        let mut sent = self.sent.lock().await;
        sent.push(email.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

/// Answers every contract lookup with the same canned reply.
pub struct StaticContractSource {
    reply: Result<UpstreamResponse, UpstreamError>,
    requested: Mutex<Vec<String>>,
}

impl StaticContractSource {
    pub fn reply(status: u16, body: Vec<u8>) -> Self {
        StaticContractSource {
            reply: Ok(UpstreamResponse { status, body }),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(message: &str) -> Self {
        StaticContractSource {
            reply: Err(UpstreamError::Transport(message.to_string())),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub async fn requested(&self) -> Vec<String> {
        self.requested.lock().await.clone()
    }
}

#[async_trait]
impl ContractSource for StaticContractSource {
    async fn fetch_contract(&self, contract_id: &str) -> Result<UpstreamResponse, UpstreamError> {
        self.requested.lock().await.push(contract_id.to_string());
        self.reply.clone()
    }
}
