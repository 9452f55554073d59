use super::model::Company;
use crate::ports::{CompanyStore, StoreError};

/// Find the company named exactly `name` (after trimming), creating it when
/// absent. Blank names resolve to no company.
pub async fn resolve_company(
    store: &dyn CompanyStore,
    name: &str,
) -> Result<Option<Company>, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    if let Some(existing) = store.find_company_by_name(name).await? {
        return Ok(Some(existing));
    }

    let company = store.insert_company(&Company::new(name)).await?;
    tracing::info!("Created company {} ({})", company.company_name, company.company_id);
    Ok(Some(company))
}
