//! Single-table DynamoDB store for profiles, companies and feedback.
//!
//! | entity   | PK               | SK                  |
//! |----------|------------------|---------------------|
//! | profile  | `USER#{id}`      | `USER#{id}`         |
//! | company  | `COMPANY`        | `COMPANY#{name}`    |
//! | company  | `COMPANY#ID#{id}`| `COMPANY#ID#{id}`   |
//! | feedback | `FEEDBACK`       | `FEEDBACK#{id}`     |
//!
//! Profiles also carry `GSI1PK = EMAIL#{email}` for lookups by address.
//! Each company is stored twice, under its name for uniqueness and under its
//! id for batch reads; both items are written in one transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::{DisplayErrorContext, SdkError},
    types::{AttributeValue, KeysAndAttributes, Put, ReturnValue, TransactWriteItem},
    Client as DynamoClient,
};
use clarence_atoms::companies::Company;
use clarence_atoms::feedback::{Feedback, FeedbackFilter, FeedbackStatus, FeedbackUpdate};
use clarence_atoms::ports::{CompanyStore, FeedbackStore, ProfileStore, StoreError};
use clarence_atoms::users::{Profile, UserRole};
use clarence_atoms::Patch;

type Item = HashMap<String, AttributeValue>;

const EMAIL_INDEX: &str = "GSI1";
const COMPANY_PK: &str = "COMPANY";
const FEEDBACK_PK: &str = "FEEDBACK";
/// BatchGetItem accepts at most this many keys per call.
const BATCH_GET_LIMIT: usize = 100;
const BATCH_GET_ATTEMPTS: usize = 3;

fn user_key(user_id: &str) -> String {
    format!("USER#{}", user_id)
}

fn email_key(email: &str) -> String {
    format!("EMAIL#{}", email)
}

fn company_key(name: &str) -> String {
    format!("COMPANY#{}", name)
}

fn company_id_key(company_id: &str) -> String {
    format!("COMPANY#ID#{}", company_id)
}

fn feedback_key(feedback_id: &str) -> String {
    format!("FEEDBACK#{}", feedback_id)
}

fn store_error<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("DynamoDB {} error: {}", operation, DisplayErrorContext(&err));
    tracing::error!("{}", message);
    StoreError::Query(message)
}

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn get_s(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|v| v.to_string())
}

fn primary_key(pk: String, sk: String) -> Item {
    HashMap::from([("PK".to_string(), s(pk)), ("SK".to_string(), s(sk))])
}

fn insert_opt(item: &mut Item, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        item.insert(key.to_string(), s(value.as_str()));
    }
}

fn profile_to_item(profile: &Profile) -> Item {
    let mut item = primary_key(user_key(&profile.user_id), user_key(&profile.user_id));
    item.insert("GSI1PK".to_string(), s(email_key(&profile.email)));
    item.insert("GSI1SK".to_string(), s(user_key(&profile.user_id)));
    item.insert("user_id".to_string(), s(profile.user_id.as_str()));
    item.insert("email".to_string(), s(profile.email.as_str()));
    item.insert("first_name".to_string(), s(profile.first_name.as_str()));
    item.insert("last_name".to_string(), s(profile.last_name.as_str()));
    item.insert("role".to_string(), s(profile.role.as_str()));
    insert_opt(&mut item, "company_id", &profile.company_id);
    item.insert(
        "is_beta_tester".to_string(),
        AttributeValue::Bool(profile.is_beta_tester),
    );
    item.insert("created_at".to_string(), s(profile.created_at.as_str()));
    item
}

fn profile_from_item(item: &Item) -> Option<Profile> {
    Some(Profile {
        user_id: get_s(item, "user_id")?,
        email: get_s(item, "email")?,
        first_name: get_s(item, "first_name").unwrap_or_default(),
        last_name: get_s(item, "last_name").unwrap_or_default(),
        role: UserRole::from_stored(&get_s(item, "role").unwrap_or_default()),
        company_id: get_s(item, "company_id"),
        is_beta_tester: item
            .get("is_beta_tester")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        created_at: get_s(item, "created_at").unwrap_or_default(),
    })
}

fn company_item(pk: String, sk: String, company: &Company) -> Item {
    let mut item = primary_key(pk, sk);
    item.insert("company_id".to_string(), s(company.company_id.as_str()));
    item.insert("company_name".to_string(), s(company.company_name.as_str()));
    item.insert("created_at".to_string(), s(company.created_at.as_str()));
    item
}

/// The name-keyed item and the id-keyed item for one company.
fn company_items(company: &Company) -> (Item, Item) {
    let by_id = company_id_key(&company.company_id);
    (
        company_item(COMPANY_PK.to_string(), company_key(&company.company_name), company),
        company_item(by_id.clone(), by_id, company),
    )
}

fn company_from_item(item: &Item) -> Option<Company> {
    Some(Company {
        company_id: get_s(item, "company_id")?,
        company_name: get_s(item, "company_name")?,
        created_at: get_s(item, "created_at").unwrap_or_default(),
    })
}

fn feedback_to_item(feedback: &Feedback) -> Item {
    let mut item = primary_key(FEEDBACK_PK.to_string(), feedback_key(&feedback.feedback_id));
    item.insert("feedback_id".to_string(), s(feedback.feedback_id.as_str()));
    insert_opt(&mut item, "user_id", &feedback.user_id);
    item.insert("feedback_type".to_string(), s(feedback.feedback_type.as_str()));
    insert_opt(&mut item, "title", &feedback.title);
    item.insert("description".to_string(), s(feedback.description.as_str()));
    if let Some(rating) = feedback.rating {
        item.insert("rating".to_string(), AttributeValue::N(rating.to_string()));
    }
    insert_opt(&mut item, "page_url", &feedback.page_url);
    insert_opt(&mut item, "browser_info", &feedback.browser_info);
    if let Some(metadata) = &feedback.metadata {
        item.insert("metadata".to_string(), s(metadata.to_string()));
    }
    item.insert("status".to_string(), s(feedback.status.as_str()));
    insert_opt(&mut item, "priority", &feedback.priority);
    insert_opt(&mut item, "admin_notes", &feedback.admin_notes);
    item.insert("created_at".to_string(), s(feedback.created_at.as_str()));
    insert_opt(&mut item, "updated_at", &feedback.updated_at);
    item
}

fn feedback_from_item(item: &Item) -> Option<Feedback> {
    Some(Feedback {
        feedback_id: get_s(item, "feedback_id")?,
        user_id: get_s(item, "user_id"),
        feedback_type: get_s(item, "feedback_type")?,
        title: get_s(item, "title"),
        description: get_s(item, "description").unwrap_or_default(),
        rating: item
            .get("rating")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok()),
        page_url: get_s(item, "page_url"),
        browser_info: get_s(item, "browser_info"),
        metadata: get_s(item, "metadata").and_then(|raw| serde_json::from_str(&raw).ok()),
        status: get_s(item, "status")
            .and_then(|raw| FeedbackStatus::parse(&raw))
            .unwrap_or(FeedbackStatus::New),
        priority: get_s(item, "priority"),
        admin_notes: get_s(item, "admin_notes"),
        created_at: get_s(item, "created_at").unwrap_or_default(),
        updated_at: get_s(item, "updated_at"),
    })
}

/// Expression string with its placeholder names and values.
#[derive(Debug, Default, PartialEq)]
struct Expression {
    expression: String,
    names: HashMap<String, String>,
    values: Item,
}

fn feedback_update_expression(update: &FeedbackUpdate, updated_at: &str) -> Expression {
    let mut set = vec!["#updated_at = :updated_at"];
    let mut remove = Vec::new();
    let mut names = HashMap::from([("#updated_at".to_string(), "updated_at".to_string())]);
    let mut values = HashMap::from([(":updated_at".to_string(), s(updated_at))]);

    if let Some(status) = update.status {
        set.push("#status = :status");
        names.insert("#status".to_string(), "status".to_string());
        values.insert(":status".to_string(), s(status.as_str()));
    }

    for (field, patch, set_clause) in [
        ("priority", &update.priority, "#priority = :priority"),
        ("admin_notes", &update.admin_notes, "#admin_notes = :admin_notes"),
    ] {
        match patch {
            Patch::Unset => continue,
            Patch::Set(Some(value)) => {
                set.push(set_clause);
                values.insert(format!(":{}", field), s(value.as_str()));
            }
            Patch::Set(None) => remove.push(format!("#{}", field)),
        }
        names.insert(format!("#{}", field), field.to_string());
    }

    let mut expression = format!("SET {}", set.join(", "));
    if !remove.is_empty() {
        expression.push_str(&format!(" REMOVE {}", remove.join(", ")));
    }

    Expression {
        expression,
        names,
        values,
    }
}

fn feedback_filter_expression(filter: &FeedbackFilter) -> Option<Expression> {
    let mut clauses = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    if let Some(status) = filter.status {
        clauses.push("#status = :status");
        names.insert("#status".to_string(), "status".to_string());
        values.insert(":status".to_string(), s(status.as_str()));
    }
    if let Some(feedback_type) = &filter.feedback_type {
        clauses.push("#feedback_type = :feedback_type");
        names.insert("#feedback_type".to_string(), "feedback_type".to_string());
        values.insert(":feedback_type".to_string(), s(feedback_type.as_str()));
    }
    if let Some(user_id) = &filter.user_id {
        clauses.push("#user_id = :user_id");
        names.insert("#user_id".to_string(), "user_id".to_string());
        values.insert(":user_id".to_string(), s(user_id.as_str()));
    }

    if clauses.is_empty() {
        return None;
    }
    Some(Expression {
        expression: clauses.join(" AND "),
        names,
        values,
    })
}

pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        DynamoStore {
            client,
            table_name: table_name.into(),
        }
    }

    async fn get_item(&self, pk: String, sk: String) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(primary_key(pk, sk)))
            .send()
            .await
            .map_err(|e| store_error("get_item", e))?;
        Ok(output.item().cloned())
    }

    /// Every item in one partition, following pagination.
    async fn query_partition(
        &self,
        pk: &str,
        filter: Option<Expression>,
    ) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut builder = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", s(pk))
                .set_exclusive_start_key(start_key.take());

            if let Some(filter) = &filter {
                builder = builder.filter_expression(&filter.expression);
                for (k, v) in &filter.names {
                    builder = builder.expression_attribute_names(k, v);
                }
                for (k, v) in &filter.values {
                    builder = builder.expression_attribute_values(k, v.clone());
                }
            }

            let output = builder.send().await.map_err(|e| store_error("query", e))?;
            items.extend(output.items().iter().cloned());

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }
}

impl DynamoStore {
    /// BatchGetItem in chunks, retrying unprocessed keys a few times.
    async fn batch_get(&self, keys: Vec<Item>, entity: &str) -> Result<Vec<Item>, StoreError> {
        let mut found = Vec::new();

        for chunk in keys.chunks(BATCH_GET_LIMIT) {
            let mut pending = chunk.to_vec();

            for _ in 0..BATCH_GET_ATTEMPTS {
                if pending.is_empty() {
                    break;
                }
                let request = KeysAndAttributes::builder()
                    .set_keys(Some(std::mem::take(&mut pending)))
                    .build()
                    .map_err(|e| StoreError::Query(e.to_string()))?;

                let output = self
                    .client
                    .batch_get_item()
                    .request_items(&self.table_name, request)
                    .send()
                    .await
                    .map_err(|e| store_error("batch_get_item", e))?;

                if let Some(items) = output.responses().and_then(|r| r.get(&self.table_name)) {
                    found.extend(items.iter().cloned());
                }
                if let Some(unprocessed) =
                    output.unprocessed_keys().and_then(|u| u.get(&self.table_name))
                {
                    pending = unprocessed.keys().to_vec();
                }
            }

            if !pending.is_empty() {
                tracing::warn!(
                    "{} {} keys left unprocessed by batch_get_item",
                    pending.len(),
                    entity
                );
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl ProfileStore for DynamoStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let item = self.get_item(user_key(user_id), user_key(user_id)).await?;
        Ok(item.as_ref().and_then(profile_from_item))
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(EMAIL_INDEX)
            .key_condition_expression("GSI1PK = :email")
            .expression_attribute_values(":email", s(email_key(email)))
            .limit(1)
            .send()
            .await
            .map_err(|e| store_error("query", e))?;
        Ok(output.items().first().and_then(profile_from_item))
    }

    async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError> {
        let keys = user_ids
            .iter()
            .map(|id| primary_key(user_key(id), user_key(id)))
            .collect();
        let items = self.batch_get(keys, "profile").await?;
        Ok(items.iter().filter_map(profile_from_item).collect())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(profile_to_item(profile)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| store_error("put_item", e))?;
        Ok(())
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(primary_key(user_key(user_id), user_key(user_id))))
            .send()
            .await
            .map_err(|e| store_error("delete_item", e))?;
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for DynamoStore {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let item = self
            .get_item(COMPANY_PK.to_string(), company_key(name))
            .await?;
        Ok(item.as_ref().and_then(company_from_item))
    }

    async fn insert_company(&self, company: &Company) -> Result<Company, StoreError> {
        let (by_name, by_id) = company_items(company);
        let put = |item: Item, condition: &str| -> Result<TransactWriteItem, StoreError> {
            let put = Put::builder()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression(condition)
                .build()
                .map_err(|e| StoreError::Query(e.to_string()))?;
            Ok(TransactWriteItem::builder().put(put).build())
        };

        let result = self
            .client
            .transact_write_items()
            .transact_items(put(by_name, "attribute_not_exists(SK)")?)
            .transact_items(put(by_id, "attribute_not_exists(PK)")?)
            .send()
            .await;

        match result {
            Ok(_) => Ok(company.clone()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_transaction_canceled_exception()) =>
            {
                // Lost the race; the row already stored wins.
                self.find_company_by_name(&company.company_name)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Query(format!(
                            "company {} vanished after conflicting insert",
                            company.company_name
                        ))
                    })
            }
            Err(e) => Err(store_error("transact_write_items", e)),
        }
    }

    async fn get_companies(&self, company_ids: &[String]) -> Result<Vec<Company>, StoreError> {
        let keys = company_ids
            .iter()
            .map(|id| primary_key(company_id_key(id), company_id_key(id)))
            .collect();
        let items = self.batch_get(keys, "company").await?;
        Ok(items.iter().filter_map(company_from_item).collect())
    }
}

#[async_trait]
impl FeedbackStore for DynamoStore {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(feedback_to_item(feedback)))
            .send()
            .await
            .map_err(|e| store_error("put_item", e))?;
        Ok(())
    }

    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, StoreError> {
        let items = self
            .query_partition(FEEDBACK_PK, feedback_filter_expression(filter))
            .await?;
        Ok(items.iter().filter_map(feedback_from_item).collect())
    }

    async fn update_feedback(
        &self,
        feedback_id: &str,
        update: &FeedbackUpdate,
        updated_at: &str,
    ) -> Result<Option<Feedback>, StoreError> {
        let expr = feedback_update_expression(update, updated_at);

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(primary_key(
                FEEDBACK_PK.to_string(),
                feedback_key(feedback_id),
            )))
            .update_expression(expr.expression)
            .condition_expression("attribute_exists(PK)")
            .return_values(ReturnValue::AllNew);

        for (k, v) in expr.names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr.values {
            builder = builder.expression_attribute_values(k, v);
        }

        match builder.send().await {
            Ok(output) => Ok(output.attributes().and_then(feedback_from_item)),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(store_error("update_item", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback() -> Feedback {
        Feedback {
            feedback_id: "fb-1".to_string(),
            user_id: Some("user-1".to_string()),
            feedback_type: "bug".to_string(),
            title: None,
            description: "Upload spins forever".to_string(),
            rating: Some(2),
            page_url: Some("/contracts".to_string()),
            browser_info: None,
            metadata: Some(serde_json::json!({ "viewport": "1280x800" })),
            status: FeedbackStatus::InProgress,
            priority: Some("high".to_string()),
            admin_notes: None,
            created_at: "2026-03-01T10:00:00+00:00".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn feedback_item_keeps_every_field() {
        let item = feedback_to_item(&feedback());
        assert_eq!(get_s(&item, "PK").as_deref(), Some("FEEDBACK"));
        assert_eq!(get_s(&item, "SK").as_deref(), Some("FEEDBACK#fb-1"));
        assert!(!item.contains_key("admin_notes"));
        assert_eq!(feedback_from_item(&item), Some(feedback()));
    }

    #[test]
    fn profile_item_is_indexed_by_email() {
        let profile = Profile {
            user_id: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: UserRole::Admin,
            company_id: None,
            is_beta_tester: true,
            created_at: "2026-03-01T10:00:00+00:00".to_string(),
        };
        let item = profile_to_item(&profile);
        assert_eq!(get_s(&item, "GSI1PK").as_deref(), Some("EMAIL#ada@example.com"));
        assert_eq!(profile_from_item(&item), Some(profile));
    }

    #[test]
    fn company_is_keyed_by_name_and_by_id() {
        let company = Company {
            company_id: "co-1".to_string(),
            company_name: "Acme Ltd".to_string(),
            created_at: "2026-03-01T10:00:00+00:00".to_string(),
        };
        let (by_name, by_id) = company_items(&company);

        assert_eq!(get_s(&by_name, "PK").as_deref(), Some("COMPANY"));
        assert_eq!(get_s(&by_name, "SK").as_deref(), Some("COMPANY#Acme Ltd"));
        assert_eq!(get_s(&by_id, "PK").as_deref(), Some("COMPANY#ID#co-1"));
        assert_eq!(get_s(&by_id, "SK").as_deref(), Some("COMPANY#ID#co-1"));
        assert_eq!(company_from_item(&by_name), Some(company.clone()));
        assert_eq!(company_from_item(&by_id), Some(company));
    }

    #[test]
    fn update_sets_and_removes() {
        let update = FeedbackUpdate {
            status: Some(FeedbackStatus::Resolved),
            priority: Patch::Set(Some("low".to_string())),
            admin_notes: Patch::Set(None),
        };
        let expr = feedback_update_expression(&update, "2026-03-02T09:00:00+00:00");

        assert_eq!(
            expr.expression,
            "SET #updated_at = :updated_at, #status = :status, #priority = :priority REMOVE #admin_notes"
        );
        assert_eq!(expr.names.get("#admin_notes").map(String::as_str), Some("admin_notes"));
        assert!(!expr.values.contains_key(":admin_notes"));
    }

    #[test]
    fn unset_fields_stay_out_of_the_update() {
        let update = FeedbackUpdate {
            priority: Patch::Set(Some("medium".to_string())),
            ..Default::default()
        };
        let expr = feedback_update_expression(&update, "now");
        assert_eq!(expr.expression, "SET #updated_at = :updated_at, #priority = :priority");
        assert!(!expr.names.contains_key("#status"));
    }

    #[test]
    fn empty_filter_has_no_expression() {
        assert_eq!(feedback_filter_expression(&FeedbackFilter::default()), None);

        let expr = feedback_filter_expression(&FeedbackFilter {
            status: Some(FeedbackStatus::New),
            user_id: Some("user-1".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(expr.expression, "#status = :status AND #user_id = :user_id");
    }
}
