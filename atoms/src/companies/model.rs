use serde::{Deserialize, Serialize};

/// Optional grouping for users, unique by exact name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Company {
    pub company_id: String,
    pub company_name: String,
    pub created_at: String,
}

impl Company {
    pub fn new(company_name: &str) -> Self {
        Company {
            company_id: uuid::Uuid::new_v4().to_string(),
            company_name: company_name.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
