//! Application state traits for dependency injection
//!
//! Handlers are generic over [`HasServices`], so the same router runs with
//! the production [`AppState`](crate::server::AppState) or a test state
//! backed by an in-memory identity provider.

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::middleware::{AdminGate, AuthGate};
use crate::service::{AuthService, UserService};
use metrics_exporter_prometheus::PrometheusHandle;

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The identity provider implementation
    type Provider: IdentityProvider + 'static;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Gate for routes that require a verified bearer credential
    fn auth_gate(&self) -> &AuthGate<Self::Provider>;

    /// Gate for administrator-only routes
    fn admin_gate(&self) -> &AdminGate<Self::Provider>;

    /// Get the registration/login service
    fn auth_service(&self) -> &AuthService<Self::Provider>;

    /// Get the user profile service
    fn user_service(&self) -> &UserService<Self::Provider>;

    /// Prometheus handle, when metrics are enabled
    fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        None
    }
}
