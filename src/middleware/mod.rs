//! HTTP middleware for RiderCritic Core
//!
//! - Bearer authentication gates, extractors and route middlewares
//! - Error response normalization
//! - Request ID propagation and HTTP metrics

pub mod auth;
pub mod error_response;
pub mod metrics;

pub use auth::{
    extract_bearer_credential, require_admin, require_auth, AdminGate, AdminUser, AuthGate,
    AuthUser, BearerCredential,
};
pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;
