//! Business logic layer

pub mod auth;
pub mod roles;
pub mod user;

pub use auth::AuthService;
pub use roles::{role_source_from_config, CustomClaimRoleSource, RoleSource, StaticRoleSource};
pub use user::UserService;

use crate::domain::UserProfile;
use crate::identity::{ProviderResult, UserRecord};
use std::future::Future;

/// Run a provider call, retrying once immediately on a transient failure
pub(crate) async fn with_single_retry<T, F, Fut>(operation: &str, mut call: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    match call().await {
        Err(e) if e.is_transient() => {
            tracing::warn!(operation, "Retrying after transient provider error: {}", e);
            call().await
        }
        other => other,
    }
}

/// Build the client-facing profile for a provider record
pub(crate) fn to_profile(record: UserRecord, roles: Vec<String>) -> UserProfile {
    UserProfile {
        uid: record.uid,
        email: record.email,
        display_name: record.display_name,
        photo_url: record.photo_url,
        email_verified: record.email_verified,
        disabled: record.disabled,
        roles,
        created_at: record.created_at,
        updated_at: record.last_refresh_at,
    }
}
