//! Identity provider integration
//!
//! The rest of the crate talks to the provider only through the
//! [`IdentityProvider`] trait. [`FirebaseClient`] is the production
//! implementation backed by the Identity Toolkit REST API.

mod client;
mod credentials;
mod token;
mod types;

pub use client::FirebaseClient;
pub use credentials::ServiceAccountKey;
pub use token::{CustomTokenSigner, IdTokenVerifier};
pub use types::*;

use crate::domain::Claims;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Failures reported by the identity provider, before translation into `AppError`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("user not found")]
    UserNotFound,

    #[error("email already exists")]
    EmailExists,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid email or password")]
    InvalidPassword,

    #[error("rejected by identity provider: {0}")]
    Rejected(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected identity provider response: {0}")]
    Protocol(String),
}

impl ProviderError {
    /// Whether a single immediate retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_))
    }

    /// Stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::UserNotFound => "user_not_found",
            ProviderError::EmailExists => "email_exists",
            ProviderError::InvalidToken(_) => "invalid_token",
            ProviderError::InvalidPassword => "invalid_password",
            ProviderError::Rejected(_) => "rejected",
            ProviderError::Unavailable(_) => "unavailable",
            ProviderError::Protocol(_) => "protocol",
        }
    }
}

/// Operations this service delegates to the external identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer credential and return its claims
    async fn verify_token(&self, token: &str) -> ProviderResult<Claims>;

    async fn get_user(&self, uid: &str) -> ProviderResult<UserRecord>;

    async fn create_user(&self, account: &NewAccount) -> ProviderResult<UserRecord>;

    /// Apply a partial update and return the resulting record
    async fn update_user(&self, uid: &str, update: &AccountUpdate) -> ProviderResult<UserRecord>;

    async fn delete_user(&self, uid: &str) -> ProviderResult<()>;

    /// Check an email/password pair; returns the uid of the matching account
    async fn verify_password(&self, email: &str, password: &str) -> ProviderResult<String>;

    /// Mint a custom token that a client exchanges for an ID token
    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String>;

    /// Replace the custom claims carried by the user's future ID tokens
    async fn set_custom_claims(&self, uid: &str, claims: &Map<String, Value>)
        -> ProviderResult<()>;
}
