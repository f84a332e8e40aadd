//! User profile domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Token type label returned by the login endpoints
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Account profile as returned to API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
    pub roles: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for registering a new account
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
}

impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("display_name", &self.display_name)
            .field("photo_url", &self.photo_url)
            .finish()
    }
}

/// Partial update of the caller's own profile. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub photo_url: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

impl UpdateProfileInput {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none() && self.email.is_none()
    }
}

/// JSON login body
#[derive(Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant form body (`username` carries the email)
///
/// Missing credentials deserialize as empty strings so the login path
/// rejects them with the usual 401.
#[derive(Clone, Deserialize)]
pub struct TokenRequestForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub grant_type: Option<String>,
}

impl From<TokenRequestForm> for LoginInput {
    fn from(form: TokenRequestForm) -> Self {
        Self {
            email: form.username,
            password: form.password,
        }
    }
}

/// Issued bearer credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
        }
    }
}
