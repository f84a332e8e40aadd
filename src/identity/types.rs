//! Identity Toolkit data types

use super::{ProviderError, ProviderResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account as stored by the identity provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
    pub custom_claims: Map<String, Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

/// Account creation request
#[derive(Clone, Default)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("display_name", &self.display_name)
            .field("photo_url", &self.photo_url)
            .finish()
    }
}

/// Partial account update; `None` leaves the attribute unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none() && self.email.is_none()
    }
}

impl From<crate::domain::UpdateProfileInput> for AccountUpdate {
    fn from(input: crate::domain::UpdateProfileInput) -> Self {
        Self {
            display_name: input.display_name,
            photo_url: input.photo_url,
            email: input.email,
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// `UserInfo` as returned by `accounts:lookup`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUserInfo {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Custom claims, serialized as a JSON string
    #[serde(default)]
    pub custom_attributes: Option<String>,
    /// Milliseconds since epoch, as a string
    #[serde(default)]
    pub created_at: Option<String>,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub last_refresh_at: Option<String>,
}

impl TryFrom<RawUserInfo> for UserRecord {
    type Error = ProviderError;

    fn try_from(raw: RawUserInfo) -> ProviderResult<Self> {
        let custom_claims = match raw.custom_attributes.as_deref() {
            None | Some("") => Map::new(),
            Some(attrs) => serde_json::from_str(attrs).map_err(|e| {
                ProviderError::Protocol(format!("Invalid customAttributes: {}", e))
            })?,
        };

        let created_at = raw
            .created_at
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        let last_refresh_at = raw
            .last_refresh_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Ok(Self {
            uid: raw.local_id,
            email: raw.email,
            display_name: raw.display_name,
            photo_url: raw.photo_url,
            email_verified: raw.email_verified,
            disabled: raw.disabled,
            custom_claims,
            created_at,
            last_refresh_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub users: Vec<RawUserInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LocalIdResponse {
    pub local_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAccountRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<&'a str>,
    pub email_verified: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateAccountRequest<'a> {
    pub local_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<String>,
}

impl<'a> UpdateAccountRequest<'a> {
    pub fn for_uid(local_id: &'a str) -> Self {
        Self {
            local_id,
            display_name: None,
            photo_url: None,
            email: None,
            custom_attributes: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInWithPasswordRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// Error envelope used by Google APIs
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    /// Leading error code, e.g. `"WEAK_PASSWORD : ..."` -> `"WEAK_PASSWORD"`
    pub fn code(&self) -> &str {
        self.message
            .split(|c: char| c == ':' || c.is_whitespace())
            .next()
            .unwrap_or_default()
    }
}
