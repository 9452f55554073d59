use std::collections::{BTreeSet, HashMap};

use clarence_atoms::feedback::{load_feedback_page, FeedbackParams, FeedbackQuery};
use clarence_atoms::ports::{CompanyStore, FeedbackStore, ProfileStore};
use clarence_atoms::{response, ApiError};
use lambda_http::{http::StatusCode, Body, Error, Response};

use crate::types::{CompanyRef, FeedbackListing, FeedbackUser, FeedbackWithUser};

/// Load one page of feedback and attach user and company display fields
/// (backend join).
pub async fn list_feedback_with_users(
    feedback: &dyn FeedbackStore,
    profiles: &dyn ProfileStore,
    companies: &dyn CompanyStore,
    query: &FeedbackQuery,
) -> Result<FeedbackListing, ApiError> {
    // 1. Page of feedback rows
    let page = load_feedback_page(feedback, query).await?;

    // 2. Profiles for the users on this page
    let user_ids: Vec<String> = page
        .items
        .iter()
        .filter_map(|f| f.user_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let profiles = if user_ids.is_empty() {
        Vec::new()
    } else {
        profiles.get_profiles(&user_ids).await?
    };

    // 3. Company names for those profiles
    let company_ids: Vec<String> = profiles
        .iter()
        .filter_map(|p| p.company_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let company_names: HashMap<String, String> = if company_ids.is_empty() {
        HashMap::new()
    } else {
        companies
            .get_companies(&company_ids)
            .await?
            .into_iter()
            .map(|c| (c.company_id, c.company_name))
            .collect()
    };

    let users: HashMap<String, FeedbackUser> = profiles
        .into_iter()
        .map(|p| {
            let company = p
                .company_id
                .as_ref()
                .and_then(|id| company_names.get(id))
                .map(|name| CompanyRef { name: name.clone() });
            (
                p.user_id,
                FeedbackUser {
                    first_name: p.first_name,
                    last_name: p.last_name,
                    email: p.email,
                    company,
                },
            )
        })
        .collect();

    // 4. Attach, keeping page order
    let rows = page
        .items
        .into_iter()
        .map(|f| {
            let user = f.user_id.as_ref().and_then(|id| users.get(id)).cloned();
            FeedbackWithUser { feedback: f, user }
        })
        .collect();

    Ok(FeedbackListing {
        feedback: rows,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    })
}

/// HTTP Handler: GET /feedback
pub async fn list_feedback(
    feedback: &dyn FeedbackStore,
    profiles: &dyn ProfileStore,
    companies: &dyn CompanyStore,
    params: FeedbackParams<'_>,
) -> Result<Response<Body>, Error> {
    let query = match FeedbackQuery::from_params(params) {
        Ok(query) => query,
        Err(e) => return response::api_error(&e),
    };

    match list_feedback_with_users(feedback, profiles, companies, &query).await {
        Ok(listing) => response::json(StatusCode::OK, &listing),
        Err(e) => {
            tracing::error!("Failed to list feedback: {}", e);
            response::api_error(&e)
        }
    }
}
