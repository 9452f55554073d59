use serde::{Deserialize, Serialize};

use crate::Patch;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    New,
    Reviewed,
    InProgress,
    Resolved,
    Dismissed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::New => "new",
            FeedbackStatus::Reviewed => "reviewed",
            FeedbackStatus::InProgress => "in_progress",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Dismissed => "dismissed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(FeedbackStatus::New),
            "reviewed" => Some(FeedbackStatus::Reviewed),
            "in_progress" => Some(FeedbackStatus::InProgress),
            "resolved" => Some(FeedbackStatus::Resolved),
            "dismissed" => Some(FeedbackStatus::Dismissed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Feedback {
    pub feedback_id: String,
    pub user_id: Option<String>,
    pub feedback_type: String,
    pub title: Option<String>,
    pub description: String,
    pub rating: Option<u8>,
    pub page_url: Option<String>,
    pub browser_info: Option<String>,
    /// Free-form client context (page state, viewport, ...).
    pub metadata: Option<serde_json::Value>,
    pub status: FeedbackStatus,
    pub priority: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateFeedbackPayload {
    pub user_id: Option<String>,
    pub feedback_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: Option<u8>,
    pub page_url: Option<String>,
    pub browser_info: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// PATCH /feedback body: the record id plus the mutable allow-list.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateFeedbackPayload {
    pub feedback_id: Option<String>,
    #[serde(default)]
    pub status: Patch<FeedbackStatus>,
    #[serde(default)]
    pub priority: Patch<String>,
    #[serde(default)]
    pub admin_notes: Patch<String>,
}

/// Fields to change on a feedback row. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackUpdate {
    pub status: Option<FeedbackStatus>,
    pub priority: Patch<String>,
    pub admin_notes: Patch<String>,
}

impl FeedbackUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_unset() && self.admin_notes.is_unset()
    }

    pub fn apply_to(&self, feedback: &mut Feedback, updated_at: &str) {
        if let Some(status) = self.status {
            feedback.status = status;
        }
        self.priority.clone().apply_to(&mut feedback.priority);
        self.admin_notes.clone().apply_to(&mut feedback.admin_notes);
        feedback.updated_at = Some(updated_at.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
    pub feedback_type: Option<String>,
    pub user_id: Option<String>,
}

impl FeedbackFilter {
    pub fn matches(&self, feedback: &Feedback) -> bool {
        self.status.map_or(true, |s| feedback.status == s)
            && self
                .feedback_type
                .as_deref()
                .map_or(true, |t| feedback.feedback_type == t)
            && self
                .user_id
                .as_deref()
                .map_or(true, |u| feedback.user_id.as_deref() == Some(u))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackQuery {
    pub filter: FeedbackFilter,
    pub limit: usize,
    pub offset: usize,
}

/// One page of results plus the unpaged match count.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackPage {
    pub items: Vec<Feedback>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
