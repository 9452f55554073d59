use serde::Serialize;

use clarence_atoms::feedback::Feedback;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CompanyRef {
    pub name: String,
}

/// Display fields of the user who left the feedback.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FeedbackUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<CompanyRef>,
}

// ========== FEEDBACK RESPONSE (joined) ==========
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FeedbackWithUser {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub user: Option<FeedbackUser>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FeedbackListing {
    pub feedback: Vec<FeedbackWithUser>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
