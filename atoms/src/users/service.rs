use super::model::{CreateUserPayload, CreatedUser, NewIdentity, Profile, UserRole};
use crate::companies::resolve_company;
use crate::ports::{CompanyStore, IdentityProvider, ProfileStore};
use crate::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Loose `local@domain.tld` shape check, no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Resolve the caller's bearer token to an admin profile.
pub async fn require_admin(
    identity: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    authorization: Option<&str>,
) -> Result<Profile, ApiError> {
    let token = bearer_token(authorization)
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid authorization header".to_string()))?;

    let user_id = identity.resolve_token(token).await?;

    match profiles.get_profile(&user_id).await? {
        Some(profile) if profile.is_admin() => Ok(profile),
        _ => {
            tracing::warn!("Non-admin user {} attempted an admin operation", user_id);
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Validate the payload and return it normalized: trimmed names, trimmed and
/// lowercased email.
pub fn validate_new_user(payload: CreateUserPayload) -> Result<CreateUserPayload, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let first_name = payload.first_name.trim().to_string();
    let last_name = payload.last_name.trim().to_string();

    if email.is_empty() || payload.password.is_empty() || first_name.is_empty() || last_name.is_empty() {
        return Err(ApiError::bad_request(
            "Missing required fields: email, password, firstName, lastName",
        ));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(CreateUserPayload {
        email,
        password: payload.password,
        first_name,
        last_name,
        company_name: payload.company_name,
    })
}

/// Create one auth identity and its profile, or neither.
///
/// The identity is deleted again if the profile insert fails. That rollback
/// is best effort: a crash between the two writes leaves an orphan identity.
pub async fn provision_user(
    identity: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    companies: &dyn CompanyStore,
    payload: CreateUserPayload,
) -> Result<CreatedUser, ApiError> {
    let payload = validate_new_user(payload)?;

    if profiles.find_profile_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::bad_request("A user with this email already exists"));
    }

    let user_id = identity
        .create_identity(&NewIdentity {
            email: payload.email.clone(),
            password: payload.password.clone(),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create auth identity for {}: {}", payload.email, e);
            ApiError::Upstream(e.to_string())
        })?;

    // Company problems never block the user itself.
    let company_id = match payload.company_name.as_deref() {
        Some(name) => match resolve_company(companies, name).await {
            Ok(company) => company.map(|c| c.company_id),
            Err(e) => {
                tracing::warn!("Failed to resolve company {:?}: {}", name, e);
                None
            }
        },
        None => None,
    };

    let profile = Profile {
        user_id: user_id.clone(),
        email: payload.email.clone(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        role: UserRole::User,
        company_id,
        is_beta_tester: true,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    if let Err(e) = profiles.insert_profile(&profile).await {
        tracing::error!("Failed to insert profile for {}: {}", user_id, e);
        if let Err(rollback) = identity.delete_identity(&user_id).await {
            tracing::error!("Rollback failed, identity {} is orphaned: {}", user_id, rollback);
        }
        return Err(ApiError::Upstream(format!("Failed to create user profile: {}", e)));
    }

    tracing::info!("Provisioned user {} ({})", profile.email, user_id);
    Ok(CreatedUser {
        user_id,
        email: payload.email,
    })
}

/// Delete the profile, then the identity. Only the identity delete is fatal.
pub async fn remove_user(
    identity: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    user_id: Option<&str>,
) -> Result<(), ApiError> {
    let user_id = user_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    if let Err(e) = profiles.delete_profile(user_id).await {
        tracing::warn!("Failed to delete profile {}: {}", user_id, e);
    }

    identity.delete_identity(user_id).await.map_err(|e| {
        tracing::error!("Failed to delete auth identity {}: {}", user_id, e);
        ApiError::Upstream(e.to_string())
    })?;

    tracing::info!("Deleted user {}", user_id);
    Ok(())
}
