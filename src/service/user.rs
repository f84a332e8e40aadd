//! User profile business logic

use super::{to_profile, with_single_retry, RoleSource};
use crate::domain::{Claims, UpdateProfileInput, UserProfile};
use crate::error::{AppError, Result};
use crate::identity::{AccountUpdate, IdentityProvider, ProviderError};
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::Validate;

/// Claim names reserved by JWT and Firebase; not settable as custom claims
pub const RESERVED_CLAIMS: &[&str] = &[
    "acr", "amr", "at_hash", "aud", "auth_time", "azp", "cnf", "c_hash", "exp", "firebase",
    "iat", "iss", "jti", "nbf", "nonce", "sub",
];

/// Maximum serialized size of a custom claims object
pub const MAX_CLAIMS_PAYLOAD_BYTES: usize = 1000;

pub struct UserService<P: IdentityProvider> {
    provider: Arc<P>,
    roles: Arc<dyn RoleSource>,
}

impl<P: IdentityProvider> UserService<P> {
    pub fn new(provider: Arc<P>, roles: Arc<dyn RoleSource>) -> Self {
        Self { provider, roles }
    }

    /// Profile of the authenticated caller
    pub async fn get_self(&self, claims: &Claims) -> Result<UserProfile> {
        let uid = claims.subject();
        let record = with_single_retry("get_user", || self.provider.get_user(uid))
            .await
            .map_err(|e| match e {
                ProviderError::UserNotFound => AppError::NotFound("User not found".to_string()),
                other => AppError::Internal(anyhow::anyhow!("Failed to load user: {}", other)),
            })?;

        let roles = self.roles.roles_for(&record);
        Ok(to_profile(record, roles))
    }

    /// Apply a partial update to the caller's own profile
    pub async fn update_self(
        &self,
        claims: &Claims,
        input: UpdateProfileInput,
    ) -> Result<UserProfile> {
        input.validate()?;

        if input.is_empty() {
            return self.get_self(claims).await;
        }

        let uid = claims.subject();
        let update = AccountUpdate::from(input);
        let record = with_single_retry("update_user", || self.provider.update_user(uid, &update))
            .await
            .map_err(|e| match e {
                ProviderError::UserNotFound => AppError::NotFound("User not found".to_string()),
                ProviderError::EmailExists => {
                    AppError::BadRequest("Email already in use".to_string())
                }
                ProviderError::Rejected(reason) => AppError::BadRequest(reason),
                other => AppError::Internal(anyhow::anyhow!("Failed to update user: {}", other)),
            })?;

        tracing::info!(uid = %uid, "Updated profile");
        let roles = self.roles.roles_for(&record);
        Ok(to_profile(record, roles))
    }

    // ========================================================================
    // Administration
    // ========================================================================

    pub async fn get_user(&self, uid: &str) -> Result<UserProfile> {
        let record = with_single_retry("get_user", || self.provider.get_user(uid))
            .await
            .map_err(|e| admin_error(uid, e))?;

        let roles = self.roles.roles_for(&record);
        Ok(to_profile(record, roles))
    }

    pub async fn delete_user(&self, uid: &str) -> Result<()> {
        self.provider
            .delete_user(uid)
            .await
            .map_err(|e| admin_error(uid, e))?;

        tracing::info!(uid = %uid, "Deleted account");
        Ok(())
    }

    /// Replace a user's custom claims
    pub async fn set_custom_claims(&self, uid: &str, claims: Value) -> Result<()> {
        let claims = validate_custom_claims(claims)?;

        self.provider
            .set_custom_claims(uid, &claims)
            .await
            .map_err(|e| admin_error(uid, e))?;

        tracing::info!(uid = %uid, keys = claims.len(), "Updated custom claims");
        Ok(())
    }
}

fn admin_error(uid: &str, err: ProviderError) -> AppError {
    match err {
        ProviderError::UserNotFound => AppError::NotFound(format!("User {} not found", uid)),
        ProviderError::Rejected(reason) => AppError::BadRequest(reason),
        other => AppError::Internal(anyhow::anyhow!("Identity provider error: {}", other)),
    }
}

fn validate_custom_claims(claims: Value) -> Result<Map<String, Value>> {
    let claims = match claims {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::BadRequest(
                "Custom claims must be a JSON object".to_string(),
            ))
        }
    };

    if let Some(reserved) = claims
        .keys()
        .find(|key| RESERVED_CLAIMS.contains(&key.as_str()))
    {
        return Err(AppError::BadRequest(format!(
            "Claim '{}' is reserved and cannot be set",
            reserved
        )));
    }

    let size = Value::Object(claims.clone()).to_string().len();
    if size > MAX_CLAIMS_PAYLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "Custom claims payload must not exceed {} bytes",
            MAX_CLAIMS_PAYLOAD_BYTES
        )));
    }

    Ok(claims)
}
