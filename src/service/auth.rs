//! Registration and login

use super::{to_profile, RoleSource};
use crate::domain::{LoginInput, RegisterInput, TokenResponse, UserProfile};
use crate::error::{AppError, Result};
use crate::identity::{IdentityProvider, NewAccount, ProviderError};
use std::sync::Arc;
use validator::Validate;

const INVALID_LOGIN: &str = "Incorrect email or password";

pub struct AuthService<P: IdentityProvider> {
    provider: Arc<P>,
    roles: Arc<dyn RoleSource>,
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: Arc<P>, roles: Arc<dyn RoleSource>) -> Self {
        Self { provider, roles }
    }

    /// Create an account. Input is validated before the provider is contacted.
    pub async fn register(&self, input: RegisterInput) -> Result<UserProfile> {
        input.validate()?;

        let account = NewAccount {
            email: input.email,
            password: input.password,
            display_name: input.display_name,
            photo_url: input.photo_url,
        };

        let record = self
            .provider
            .create_user(&account)
            .await
            .map_err(|e| match e {
                ProviderError::EmailExists => {
                    AppError::Conflict("Email already registered".to_string())
                }
                ProviderError::Rejected(reason) => AppError::BadRequest(reason),
                other => AppError::BadRequest(other.to_string()),
            })?;

        metrics::counter!("ridercritic_registrations_total").increment(1);
        tracing::info!(uid = %record.uid, "Registered account");

        let roles = self.roles.roles_for(&record);
        Ok(to_profile(record, roles))
    }

    /// Verify the password with the provider and mint a custom token
    pub async fn login(&self, input: LoginInput) -> Result<TokenResponse> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AppError::Unauthorized(INVALID_LOGIN.to_string()));
        }

        let result = self.authenticate(&input).await;
        let outcome = match result {
            Ok(_) => "success",
            Err(AppError::Unauthorized(_)) => "rejected",
            Err(_) => "error",
        };
        metrics::counter!("ridercritic_logins_total", "outcome" => outcome).increment(1);

        result.map(TokenResponse::bearer)
    }

    async fn authenticate(&self, input: &LoginInput) -> Result<String> {
        let uid = self
            .provider
            .verify_password(&input.email, &input.password)
            .await
            .map_err(login_error)?;

        let token = self
            .provider
            .create_custom_token(&uid)
            .await
            .map_err(login_error)?;

        tracing::info!(uid = %uid, "Issued custom token");
        Ok(token)
    }
}

fn login_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::InvalidPassword
        | ProviderError::UserNotFound
        | ProviderError::InvalidToken(_)
        | ProviderError::Rejected(_) => {
            tracing::debug!("Login rejected: {}", err);
            AppError::Unauthorized(INVALID_LOGIN.to_string())
        }
        other => AppError::Internal(anyhow::anyhow!("Login failed: {}", other)),
    }
}
