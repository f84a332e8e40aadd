//! Identity Toolkit REST client
//!
//! Admin operations go through the project-scoped `v1/projects/{id}/accounts*`
//! endpoints with an OAuth2 bearer obtained from the service account (or the
//! fixed `owner` bearer against the emulator). Password checks use the public
//! `accounts:signInWithPassword` endpoint with the web API key.

use super::token::{sign_rs256, CustomTokenSigner, IdTokenVerifier};
use super::types::*;
use super::{IdentityProvider, ProviderError, ProviderResult, ServiceAccountKey};
use crate::config::FirebaseConfig;
use crate::domain::Claims;
use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const ADMIN_SCOPES: &str =
    "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/identitytoolkit";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const EMULATOR_ADMIN_TOKEN: &str = "owner";

/// Identity Toolkit client backed by Firebase Authentication
#[derive(Clone)]
pub struct FirebaseClient {
    config: FirebaseConfig,
    http_client: Client,
    base_url: String,
    verifier: IdTokenVerifier,
    signer: CustomTokenSigner,
    admin: Option<Arc<AdminCredentials>>,
    token: Arc<RwLock<Option<AdminToken>>>,
}

struct AdminCredentials {
    account: ServiceAccountKey,
    key: EncodingKey,
}

#[derive(Debug, Clone)]
struct AdminToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl FirebaseClient {
    /// Create a client from configuration.
    ///
    /// Outside emulator mode the service-account key at
    /// `credentials_path` must be readable.
    pub fn new(config: FirebaseConfig) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let (base_url, verifier, signer, admin) = match config.emulator_host {
            Some(ref host) => {
                tracing::warn!(host = %host, "Using Firebase Auth emulator; tokens are unsigned");
                (
                    format!("http://{}/identitytoolkit.googleapis.com/v1", host),
                    IdTokenVerifier::emulator(config.project_id.clone()),
                    CustomTokenSigner::unsigned(),
                    None,
                )
            }
            None => {
                let account = ServiceAccountKey::from_file(&config.credentials_path)?;
                let signer = CustomTokenSigner::from_service_account(&account)?;
                let key = account.encoding_key()?;
                (
                    format!("{}/v1", config.identity_toolkit_url.trim_end_matches('/')),
                    IdTokenVerifier::new(
                        config.project_id.clone(),
                        config.jwks_url.clone(),
                        http_client.clone(),
                    ),
                    signer,
                    Some(Arc::new(AdminCredentials { account, key })),
                )
            }
        };

        Ok(Self {
            config,
            http_client,
            base_url,
            verifier,
            signer,
            admin,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    fn project_url(&self, method: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.base_url, self.config.project_id, method
        )
    }

    /// Get admin access token (with caching)
    async fn get_admin_token(&self) -> ProviderResult<String> {
        let admin = match self.admin {
            Some(ref admin) => admin,
            None => return Ok(EMULATOR_ADMIN_TOKEN.to_string()),
        };

        {
            let token = self.token.read().await;
            if let Some(ref t) = *token {
                if t.expires_at > chrono::Utc::now() + chrono::Duration::seconds(30) {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let iat = chrono::Utc::now().timestamp();
        let assertion = sign_rs256(
            &admin.key,
            admin.account.private_key_id.clone(),
            &AssertionClaims {
                iss: &admin.account.client_email,
                scope: ADMIN_SCOPES,
                aud: &admin.account.token_uri,
                iat,
                exp: iat + 3600,
            },
        )?;

        let response = self
            .http_client
            .post(&admin.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Failed to get admin token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Service account token exchange failed: {}", body);
            return Err(if status.is_server_error() {
                ProviderError::Unavailable(format!("Failed to get admin token: {}", status))
            } else {
                ProviderError::Rejected(format!("Failed to get admin token: {}", status))
            });
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            ProviderError::Protocol(format!("Failed to parse token response: {}", e))
        })?;

        let admin_token = AdminToken {
            access_token: token_response.access_token.clone(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(token_response.expires_in),
        };

        {
            let mut token = self.token.write().await;
            *token = Some(admin_token);
        }

        Ok(token_response.access_token)
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// `admin` attaches the admin bearer; otherwise the call is public.
    async fn post_json<B, T>(
        &self,
        operation: &'static str,
        url: &str,
        body: &B,
        admin: bool,
    ) -> ProviderResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let result = self.send(url, body, admin).await;
        let outcome = match result {
            Ok(_) => "success",
            Err(ref e) => e.kind(),
        };
        metrics::counter!(
            "ridercritic_provider_requests_total",
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);

        if let Err(ref e) = result {
            if e.is_transient() {
                tracing::warn!(operation, "Identity provider call failed: {}", e);
            } else {
                tracing::debug!(operation, "Identity provider call failed: {}", e);
            }
        }
        result
    }

    async fn send<B, T>(&self, url: &str, body: &B, admin: bool) -> ProviderResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http_client.post(url).json(body);
        if admin {
            request = request.bearer_auth(self.get_admin_token().await?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_response(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Protocol(format!("Failed to parse response: {}", e)))
    }

    async fn lookup(&self, operation: &'static str, query: Value) -> ProviderResult<UserRecord> {
        let url = self.project_url("accounts:lookup");
        let response: LookupResponse = self.post_json(operation, &url, &query, true).await?;

        response
            .users
            .into_iter()
            .next()
            .ok_or(ProviderError::UserNotFound)
            .and_then(UserRecord::try_from)
    }
}

/// Translate an Identity Toolkit error response
pub(crate) fn map_error_response(status: StatusCode, body: &str) -> ProviderError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::Unavailable(format!("HTTP {}", status));
    }

    let envelope: ErrorEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) => {
            return ProviderError::Protocol(format!("HTTP {} with unparsable error body", status))
        }
    };

    match envelope.error.code() {
        "USER_NOT_FOUND" => ProviderError::UserNotFound,
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => ProviderError::EmailExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            ProviderError::InvalidPassword
        }
        "" => ProviderError::Rejected(format!("HTTP {}", status)),
        code => ProviderError::Rejected(code.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseClient {
    async fn verify_token(&self, token: &str) -> ProviderResult<Claims> {
        let result = self.verifier.verify(token).await;
        let outcome = match result {
            Ok(_) => "success",
            Err(ref e) => e.kind(),
        };
        metrics::counter!(
            "ridercritic_provider_requests_total",
            "operation" => "verify_token",
            "outcome" => outcome
        )
        .increment(1);
        result
    }

    async fn get_user(&self, uid: &str) -> ProviderResult<UserRecord> {
        self.lookup("get_user", json!({ "localId": [uid] })).await
    }

    async fn create_user(&self, account: &NewAccount) -> ProviderResult<UserRecord> {
        let url = self.project_url("accounts");
        let request = CreateAccountRequest {
            email: &account.email,
            password: &account.password,
            display_name: account.display_name.as_deref(),
            photo_url: account.photo_url.as_deref(),
            email_verified: false,
        };

        let created: LocalIdResponse = self.post_json("create_user", &url, &request, true).await?;
        tracing::info!(uid = %created.local_id, "Created account");

        // the account exists from here on; a failed read-back must not fail the call
        match self.get_user(&created.local_id).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(
                    uid = %created.local_id,
                    "Lookup after account creation failed, answering from the request: {}",
                    e
                );
                Ok(UserRecord {
                    uid: created.local_id,
                    email: Some(account.email.clone()),
                    display_name: account.display_name.clone(),
                    photo_url: account.photo_url.clone(),
                    created_at: Some(chrono::Utc::now()),
                    ..Default::default()
                })
            }
        }
    }

    async fn update_user(&self, uid: &str, update: &AccountUpdate) -> ProviderResult<UserRecord> {
        if !update.is_empty() {
            let url = self.project_url("accounts:update");
            let mut request = UpdateAccountRequest::for_uid(uid);
            request.display_name = update.display_name.as_deref();
            request.photo_url = update.photo_url.as_deref();
            request.email = update.email.as_deref();

            let _: Value = self.post_json("update_user", &url, &request, true).await?;
        }

        self.get_user(uid).await
    }

    async fn delete_user(&self, uid: &str) -> ProviderResult<()> {
        let url = self.project_url("accounts:delete");
        let _: Value = self
            .post_json("delete_user", &url, &json!({ "localId": uid }), true)
            .await?;
        Ok(())
    }

    async fn verify_password(&self, email: &str, password: &str) -> ProviderResult<String> {
        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.base_url, self.config.api_key
        );
        let request = SignInWithPasswordRequest {
            email,
            password,
            return_secure_token: false,
        };

        let response: LocalIdResponse = self
            .post_json("verify_password", &url, &request, false)
            .await?;
        Ok(response.local_id)
    }

    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String> {
        self.signer.sign(uid)
    }

    async fn set_custom_claims(
        &self,
        uid: &str,
        claims: &Map<String, Value>,
    ) -> ProviderResult<()> {
        let url = self.project_url("accounts:update");
        let mut request = UpdateAccountRequest::for_uid(uid);
        request.custom_attributes = Some(Value::Object(claims.clone()).to_string());

        let _: Value = self
            .post_json("set_custom_claims", &url, &request, true)
            .await?;
        Ok(())
    }
}
