use super::model::{
    CreateFeedbackPayload, Feedback, FeedbackFilter, FeedbackPage, FeedbackQuery, FeedbackStatus,
    FeedbackUpdate, UpdateFeedbackPayload,
};
use crate::ports::FeedbackStore;
use crate::{ApiError, Patch};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validate and store a new feedback row. Returns the new feedback id.
pub async fn create_feedback(
    store: &dyn FeedbackStore,
    payload: CreateFeedbackPayload,
) -> Result<String, ApiError> {
    let (Some(feedback_type), Some(description)) = (
        non_blank(payload.feedback_type),
        non_blank(payload.description),
    ) else {
        return Err(ApiError::bad_request(
            "Missing required fields: feedback_type and description",
        ));
    };

    let feedback = Feedback {
        feedback_id: uuid::Uuid::new_v4().to_string(),
        user_id: non_blank(payload.user_id),
        feedback_type,
        title: non_blank(payload.title),
        description,
        rating: payload.rating,
        page_url: non_blank(payload.page_url),
        browser_info: non_blank(payload.browser_info),
        metadata: payload.metadata,
        status: FeedbackStatus::New,
        priority: None,
        admin_notes: None,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: None,
    };

    store.insert_feedback(&feedback).await?;
    tracing::info!(
        "Stored {} feedback {} from {:?}",
        feedback.feedback_type,
        feedback.feedback_id,
        feedback.user_id
    );
    Ok(feedback.feedback_id)
}

/// Raw query-string values for GET /feedback.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedbackParams<'a> {
    pub status: Option<&'a str>,
    pub feedback_type: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub limit: Option<&'a str>,
    pub offset: Option<&'a str>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(name: &str, value: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match present(value) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::bad_request(format!("{} must be a non-negative integer", name))),
        None => Ok(default),
    }
}

impl FeedbackQuery {
    pub fn from_params(params: FeedbackParams<'_>) -> Result<Self, ApiError> {
        let status = match present(params.status) {
            Some(raw) => Some(
                FeedbackStatus::parse(raw)
                    .ok_or_else(|| ApiError::bad_request(format!("Invalid status: {}", raw)))?,
            ),
            None => None,
        };

        let limit = parse_count("limit", params.limit, DEFAULT_PAGE_LIMIT)?.clamp(1, MAX_PAGE_LIMIT);
        let offset = parse_count("offset", params.offset, 0)?;

        Ok(FeedbackQuery {
            filter: FeedbackFilter {
                status,
                feedback_type: present(params.feedback_type).map(str::to_string),
                user_id: present(params.user_id).map(str::to_string),
            },
            limit,
            offset,
        })
    }

    /// Order newest first and cut the requested page. `total` counts every
    /// row that matched, regardless of paging.
    pub fn paginate(&self, mut rows: Vec<Feedback>) -> FeedbackPage {
        rows.retain(|row| self.filter.matches(row));
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.feedback_id.cmp(&b.feedback_id))
        });

        let total = rows.len();
        let items = rows.into_iter().skip(self.offset).take(self.limit).collect();

        FeedbackPage {
            items,
            total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Load one page of feedback (pure domain logic, no joins).
pub async fn load_feedback_page(
    store: &dyn FeedbackStore,
    query: &FeedbackQuery,
) -> Result<FeedbackPage, ApiError> {
    let rows = store.list_feedback(&query.filter).await?;
    Ok(query.paginate(rows))
}

/// Apply the fields present in `payload` to an existing feedback row.
pub async fn update_feedback(
    store: &dyn FeedbackStore,
    payload: UpdateFeedbackPayload,
) -> Result<Feedback, ApiError> {
    let feedback_id = non_blank(payload.feedback_id)
        .ok_or_else(|| ApiError::bad_request("feedback_id is required"))?;

    let status = match payload.status {
        Patch::Unset => None,
        Patch::Set(Some(status)) => Some(status),
        Patch::Set(None) => return Err(ApiError::bad_request("status cannot be null")),
    };

    let update = FeedbackUpdate {
        status,
        priority: payload.priority,
        admin_notes: payload.admin_notes,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let updated_at = chrono::Utc::now().to_rfc3339();
    match store.update_feedback(&feedback_id, &update, &updated_at).await? {
        Some(feedback) => {
            tracing::info!("Updated feedback {} (status {})", feedback_id, feedback.status.as_str());
            Ok(feedback)
        }
        None => Err(ApiError::bad_request("Feedback not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;
    use rstest::rstest;

    fn payload(feedback_type: &str, description: &str) -> CreateFeedbackPayload {
        CreateFeedbackPayload {
            feedback_type: Some(feedback_type.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    async fn seed(store: &InMemoryStore, count: usize) {
        for i in 0..count {
            store
                .put_feedback(Feedback {
                    feedback_id: format!("fb-{:02}", i),
                    user_id: Some(if i % 2 == 0 { "u-even" } else { "u-odd" }.to_string()),
                    feedback_type: if i % 3 == 0 { "bug" } else { "idea" }.to_string(),
                    title: None,
                    description: format!("item {}", i),
                    rating: Some(4),
                    page_url: Some("/pricing".to_string()),
                    browser_info: None,
                    metadata: None,
                    status: FeedbackStatus::New,
                    priority: Some("low".to_string()),
                    admin_notes: Some("triaged".to_string()),
                    created_at: format!("2026-03-01T10:{:02}:00+00:00", i),
                    updated_at: None,
                })
                .await;
        }
    }

    fn query(params: FeedbackParams<'_>) -> FeedbackQuery {
        FeedbackQuery::from_params(params).unwrap()
    }

    #[tokio::test]
    async fn create_defaults_optional_fields_and_status() {
        let store = InMemoryStore::default();
        let id = create_feedback(&store, payload("bug", "Button does nothing"))
            .await
            .unwrap();

        let stored = store.feedback(&id).await.unwrap();
        assert_eq!(stored.status, FeedbackStatus::New);
        assert_eq!(stored.user_id, None);
        assert_eq!(stored.rating, None);
        assert_eq!(stored.admin_notes, None);
        assert_eq!(stored.updated_at, None);
    }

    #[rstest]
    #[case(None, Some("text"))]
    #[case(Some("bug"), None)]
    #[case(Some(" "), Some("text"))]
    #[case(Some("bug"), Some(""))]
    #[tokio::test]
    async fn create_requires_type_and_description(
        #[case] feedback_type: Option<&str>,
        #[case] description: Option<&str>,
    ) {
        let store = InMemoryStore::default();
        let err = create_feedback(
            &store,
            CreateFeedbackPayload {
                feedback_type: feedback_type.map(str::to_string),
                description: description.map(str::to_string),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(store.feedback_count().await, 0);
    }

    #[tokio::test]
    async fn page_keeps_unpaged_total() {
        let store = InMemoryStore::default();
        seed(&store, 25).await;

        let unpaged = load_feedback_page(
            &store,
            &query(FeedbackParams { limit: Some("100"), ..Default::default() }),
        )
        .await
        .unwrap();
        let page = load_feedback_page(
            &store,
            &query(FeedbackParams {
                limit: Some("10"),
                offset: Some("20"),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, unpaged.total);
        assert_eq!(page.total, 25);
        assert_eq!(page.items[0].feedback_id, "fb-04");
    }

    #[tokio::test]
    async fn filters_combine() {
        let store = InMemoryStore::default();
        seed(&store, 12).await;

        let page = load_feedback_page(
            &store,
            &query(FeedbackParams {
                feedback_type: Some("bug"),
                user_id: Some("u-even"),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        // bug: 0, 3, 6, 9; even: 0, 6
        let ids: Vec<_> = page.items.iter().map(|f| f.feedback_id.as_str()).collect();
        assert_eq!(ids, vec!["fb-06", "fb-00"]);
        assert_eq!(page.total, 2);
    }

    #[rstest]
    #[case(FeedbackParams { limit: Some("ten"), ..Default::default() })]
    #[case(FeedbackParams { offset: Some("-1"), ..Default::default() })]
    #[case(FeedbackParams { status: Some("archived"), ..Default::default() })]
    fn rejects_bad_params(#[case] params: FeedbackParams<'static>) {
        assert!(matches!(
            FeedbackQuery::from_params(params),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(query(FeedbackParams::default()).limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(query(FeedbackParams { limit: Some("0"), ..Default::default() }).limit, 1);
        assert_eq!(
            query(FeedbackParams { limit: Some("500"), ..Default::default() }).limit,
            MAX_PAGE_LIMIT
        );
    }

    #[tokio::test]
    async fn status_only_update_leaves_other_fields() {
        let store = InMemoryStore::default();
        seed(&store, 1).await;
        let before = store.feedback("fb-00").await.unwrap();

        let payload: UpdateFeedbackPayload =
            serde_json::from_str(r#"{"feedback_id": "fb-00", "status": "resolved"}"#).unwrap();
        let updated = update_feedback(&store, payload).await.unwrap();

        assert_eq!(updated.status, FeedbackStatus::Resolved);
        assert!(updated.updated_at.is_some());
        assert_eq!(
            Feedback {
                status: before.status,
                updated_at: None,
                ..updated.clone()
            },
            before
        );
    }

    #[tokio::test]
    async fn explicit_null_clears_field() {
        let store = InMemoryStore::default();
        seed(&store, 1).await;

        let payload: UpdateFeedbackPayload =
            serde_json::from_str(r#"{"feedback_id": "fb-00", "admin_notes": null}"#).unwrap();
        let updated = update_feedback(&store, payload).await.unwrap();

        assert_eq!(updated.admin_notes, None);
        assert_eq!(updated.priority.as_deref(), Some("low"));
    }

    #[rstest]
    #[case(r#"{"status": "resolved"}"#, "feedback_id is required")]
    #[case(r#"{"feedback_id": "fb-00"}"#, "No fields to update")]
    #[case(r#"{"feedback_id": "fb-00", "status": null}"#, "status cannot be null")]
    #[case(r#"{"feedback_id": "missing", "priority": "high"}"#, "Feedback not found")]
    #[tokio::test]
    async fn update_rejections(#[case] body: &str, #[case] message: &str) {
        let store = InMemoryStore::default();
        seed(&store, 1).await;

        let payload: UpdateFeedbackPayload = serde_json::from_str(body).unwrap();
        let err = update_feedback(&store, payload).await.unwrap_err();
        assert_eq!(err, ApiError::bad_request(message));
    }
}
