//! Bearer authentication gates and extractors
//!
//! Provides:
//! - `AuthGate`: verifies the bearer credential with the identity provider
//! - `AdminGate`: an `AuthGate` plus the `admin` claim check
//! - `AuthUser` / `AdminUser` extractors and the matching route middlewares
//!
//! Verified claims are stored in the request extensions, so a route behind
//! `require_auth` that also uses `AuthUser` verifies the token only once.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::Claims;
use crate::error::{AppError, Result};
use crate::identity::IdentityProvider;
use crate::state::HasServices;

/// Raw bearer credential taken from the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerCredential([redacted])")
    }
}

/// Extract the bearer credential.
///
/// A missing header is unauthenticated (401); a header that is present but
/// not a usable bearer credential is forbidden (403).
pub fn extract_bearer_credential(headers: &HeaderMap) -> Result<BearerCredential> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))?
        .to_str()
        .map_err(|_| AppError::Forbidden("Invalid authorization header".to_string()))?;

    let (scheme, credential) = header
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| AppError::Forbidden("Invalid authorization header".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Forbidden(
            "Invalid authentication scheme".to_string(),
        ));
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AppError::Forbidden(
            "Invalid authorization header".to_string(),
        ));
    }

    Ok(BearerCredential(credential.to_string()))
}

fn record_gate(gate: &'static str, outcome: &'static str) {
    metrics::counter!("ridercritic_auth_gate_total", "gate" => gate, "outcome" => outcome)
        .increment(1);
}

/// Verifies bearer credentials and yields the provider's claims
pub struct AuthGate<P: IdentityProvider> {
    provider: Arc<P>,
}

impl<P: IdentityProvider> Clone for AuthGate<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

impl<P: IdentityProvider> AuthGate<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn verify(&self, headers: &HeaderMap) -> Result<Claims> {
        let credential = extract_bearer_credential(headers).inspect_err(|_| {
            record_gate("auth", "missing_or_malformed");
        })?;

        match self.provider.verify_token(credential.as_str()).await {
            Ok(claims) => {
                record_gate("auth", "allowed");
                Ok(claims)
            }
            Err(e) => {
                tracing::debug!("Bearer credential rejected: {}", e);
                record_gate("auth", "invalid");
                Err(AppError::Unauthorized(
                    "Invalid authentication credentials".to_string(),
                ))
            }
        }
    }

    /// Verify once per request, caching the claims in the request extensions
    pub async fn authorize(&self, parts: &mut Parts) -> Result<Claims> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(claims.clone());
        }

        let claims = self.verify(&parts.headers).await?;
        parts.extensions.insert(claims.clone());
        Ok(claims)
    }
}

/// Requires a verified credential carrying `admin: true`
pub struct AdminGate<P: IdentityProvider> {
    auth: AuthGate<P>,
}

impl<P: IdentityProvider> Clone for AdminGate<P> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<P: IdentityProvider> AdminGate<P> {
    pub fn new(auth: AuthGate<P>) -> Self {
        Self { auth }
    }

    pub async fn verify(&self, headers: &HeaderMap) -> Result<Claims> {
        let claims = self.auth.verify(headers).await?;
        Self::check(claims)
    }

    pub async fn authorize(&self, parts: &mut Parts) -> Result<Claims> {
        let claims = self.auth.authorize(parts).await?;
        Self::check(claims)
    }

    fn check(claims: Claims) -> Result<Claims> {
        if claims.is_admin() {
            record_gate("admin", "allowed");
            Ok(claims)
        } else {
            record_gate("admin", "denied");
            tracing::info!(uid = %claims.subject(), "Admin access denied");
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Axum extractor for authenticated callers
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        state.auth_gate().authorize(parts).await.map(AuthUser)
    }
}

/// Axum extractor for callers holding the admin claim
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl<S> FromRequestParts<S> for AdminUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        state.admin_gate().authorize(parts).await.map(AdminUser)
    }
}

/// Route middleware rejecting requests without a valid bearer credential
pub async fn require_auth<S: HasServices>(
    State(state): State<S>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    match state.auth_gate().authorize(&mut parts).await {
        Ok(_) => next.run(Request::from_parts(parts, body)).await,
        Err(e) => e.into_response(),
    }
}

/// Route middleware rejecting non-admin callers
pub async fn require_admin<S: HasServices>(
    State(state): State<S>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    match state.admin_gate().authorize(&mut parts).await {
        Ok(_) => next.run(Request::from_parts(parts, body)).await,
        Err(e) => e.into_response(),
    }
}
