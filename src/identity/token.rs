//! ID token verification and custom token minting
//!
//! Production tokens are RS256 JWTs: ID tokens are checked against Google's
//! published JWKS, custom tokens are signed with the service-account key.
//! Against the Auth emulator both directions use unsigned (`alg: none`)
//! tokens, but the registered claims are still validated.

use super::{ProviderError, ProviderResult, ServiceAccountKey};
use crate::domain::Claims;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{
    decode, decode_header, encode, jwk::JwkSet, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use reqwest::{header::CACHE_CONTROL, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Audience of custom tokens
pub const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

/// Issuer/subject placed in custom tokens minted for the emulator
const EMULATOR_SIGNER: &str = "firebase-auth-emulator@example.com";

const CUSTOM_TOKEN_LIFETIME_SECS: i64 = 3600;
const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(3600);
const MAX_UID_LENGTH: usize = 128;

/// Issuer expected on ID tokens for a project
pub fn id_token_issuer(project_id: &str) -> String {
    format!("https://securetoken.google.com/{}", project_id)
}

// ============================================================================
// ID token verification
// ============================================================================

#[derive(Clone)]
struct CachedJwks {
    keys: JwkSet,
    expires_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }

    fn key(&self, kid: &str) -> ProviderResult<DecodingKey> {
        match self.keys.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map_err(|e| ProviderError::Protocol(format!("Invalid JWK: {}", e))),
            None => {
                tracing::debug!(kid = %kid, "ID token signed with unknown key");
                Err(ProviderError::InvalidToken("unknown key id".to_string()))
            }
        }
    }
}

/// Verifies Firebase ID tokens
#[derive(Clone)]
pub struct IdTokenVerifier {
    project_id: String,
    jwks_url: String,
    emulator: bool,
    http_client: Client,
    jwks: Arc<RwLock<Option<CachedJwks>>>,
}

impl IdTokenVerifier {
    pub fn new(project_id: String, jwks_url: String, http_client: Client) -> Self {
        Self {
            project_id,
            jwks_url,
            emulator: false,
            http_client,
            jwks: Arc::new(RwLock::new(None)),
        }
    }

    /// Verifier accepting the emulator's unsigned tokens
    pub fn emulator(project_id: String) -> Self {
        Self {
            project_id,
            jwks_url: String::new(),
            emulator: true,
            http_client: Client::new(),
            jwks: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn verify(&self, token: &str) -> ProviderResult<Claims> {
        let claims = if self.emulator {
            self.verify_unsigned(token, chrono::Utc::now().timestamp())?
        } else {
            self.verify_signed(token).await?
        };

        if claims.subject().is_empty() {
            return Err(ProviderError::InvalidToken("empty subject".to_string()));
        }
        Ok(claims)
    }

    async fn verify_signed(&self, token: &str) -> ProviderResult<Claims> {
        let header = decode_header(token)
            .map_err(|e| ProviderError::InvalidToken(format!("malformed header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(ProviderError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| ProviderError::InvalidToken("missing key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[id_token_issuer(&self.project_id)]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| ProviderError::InvalidToken(e.to_string()))
    }

    /// Decode an unsigned token and check its registered claims
    fn verify_unsigned(&self, token: &str, now: i64) -> ProviderResult<Claims> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| ProviderError::InvalidToken("malformed token".to_string()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ProviderError::InvalidToken(format!("malformed payload: {}", e)))?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::InvalidToken(format!("malformed claims: {}", e)))?;

        if claims.get("aud").and_then(|v| v.as_str()) != Some(self.project_id.as_str()) {
            return Err(ProviderError::InvalidToken("audience mismatch".to_string()));
        }
        if claims.get("iss").and_then(|v| v.as_str())
            != Some(id_token_issuer(&self.project_id).as_str())
        {
            return Err(ProviderError::InvalidToken("issuer mismatch".to_string()));
        }
        match claims.get("exp").and_then(|v| v.as_i64()) {
            Some(exp) if exp > now => {}
            Some(_) => return Err(ProviderError::InvalidToken("token expired".to_string())),
            None => return Err(ProviderError::InvalidToken("missing exp".to_string())),
        }

        Ok(claims)
    }

    /// Key for `kid` from the cached JWKS, refetching only once the cache has expired.
    ///
    /// A kid missing from a fresh key set is an invalid token; it never
    /// triggers a download. Refreshes run under the write lock, so concurrent
    /// requests against a stale cache share one fetch.
    async fn decoding_key(&self, kid: &str) -> ProviderResult<DecodingKey> {
        {
            let cache = self.jwks.read().await;
            if let Some(ref cached) = *cache {
                if cached.is_fresh() {
                    return cached.key(kid);
                }
            }
        }

        let mut cache = self.jwks.write().await;
        // another request may have refreshed while we waited for the lock
        if let Some(ref cached) = *cache {
            if cached.is_fresh() {
                return cached.key(kid);
            }
        }

        let fresh = self.fetch_jwks().await?;
        let key = fresh.key(kid);
        *cache = Some(fresh);
        key
    }

    async fn fetch_jwks(&self) -> ProviderResult<CachedJwks> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Failed to fetch JWKS: {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_JWKS_TTL);

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| ProviderError::Protocol(format!("Failed to parse JWKS: {}", e)))?;

        tracing::debug!(keys = keys.keys.len(), ttl_secs = ttl.as_secs(), "Refreshed JWKS");

        Ok(CachedJwks {
            keys,
            expires_at: Instant::now() + ttl,
        })
    }
}

/// `max-age` directive of a Cache-Control header
fn parse_max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// ============================================================================
// Custom tokens
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct CustomTokenClaims {
    aud: String,
    iss: String,
    sub: String,
    uid: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
struct RsaSigner {
    client_email: String,
    key_id: Option<String>,
    key: EncodingKey,
}

/// Mints custom tokens that clients exchange for ID tokens
#[derive(Clone)]
pub struct CustomTokenSigner {
    signer: Option<RsaSigner>,
}

impl CustomTokenSigner {
    /// Signer producing unsigned tokens, accepted only by the emulator
    pub fn unsigned() -> Self {
        Self { signer: None }
    }

    pub fn from_service_account(account: &ServiceAccountKey) -> anyhow::Result<Self> {
        Ok(Self {
            signer: Some(RsaSigner {
                client_email: account.client_email.clone(),
                key_id: account.private_key_id.clone(),
                key: account.encoding_key()?,
            }),
        })
    }

    pub fn sign(&self, uid: &str) -> ProviderResult<String> {
        if uid.is_empty() || uid.chars().count() > MAX_UID_LENGTH {
            return Err(ProviderError::Rejected(format!(
                "uid must be between 1 and {} characters",
                MAX_UID_LENGTH
            )));
        }

        let iat = chrono::Utc::now().timestamp();
        let issuer = self
            .signer
            .as_ref()
            .map(|s| s.client_email.as_str())
            .unwrap_or(EMULATOR_SIGNER);
        let claims = CustomTokenClaims {
            aud: CUSTOM_TOKEN_AUDIENCE.to_string(),
            iss: issuer.to_string(),
            sub: issuer.to_string(),
            uid: uid.to_string(),
            iat,
            exp: iat + CUSTOM_TOKEN_LIFETIME_SECS,
        };

        match self.signer {
            Some(ref signer) => sign_rs256(&signer.key, signer.key_id.clone(), &claims),
            None => encode_unsigned(&claims),
        }
    }
}

/// Sign `claims` as an RS256 JWT
pub(crate) fn sign_rs256<T: Serialize>(
    key: &EncodingKey,
    key_id: Option<String>,
    claims: &T,
) -> ProviderResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key_id;
    encode(&header, claims, key)
        .map_err(|e| ProviderError::Protocol(format!("Failed to sign token: {}", e)))
}

fn encode_unsigned<T: Serialize>(claims: &T) -> ProviderResult<String> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| ProviderError::Protocol(format!("Failed to encode claims: {}", e)))?;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    Ok(format!("{}.{}.", header, URL_SAFE_NO_PAD.encode(payload)))
}
