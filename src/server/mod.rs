//! Server initialization

use crate::api;
use crate::config::{Config, CorsConfig};
use crate::identity::FirebaseClient;
use crate::middleware::{
    normalize_error_response, require_admin, require_auth, AdminGate, AuthGate,
    ObservabilityLayer,
};
use crate::service::{role_source_from_config, AuthService, UserService};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Production application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_gate: AuthGate<FirebaseClient>,
    pub admin_gate: AdminGate<FirebaseClient>,
    pub auth_service: Arc<AuthService<FirebaseClient>>,
    pub user_service: Arc<UserService<FirebaseClient>>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl HasServices for AppState {
    type Provider = FirebaseClient;

    fn config(&self) -> &Config {
        &self.config
    }

    fn auth_gate(&self) -> &AuthGate<FirebaseClient> {
        &self.auth_gate
    }

    fn admin_gate(&self) -> &AdminGate<FirebaseClient> {
        &self.admin_gate
    }

    fn auth_service(&self) -> &AuthService<FirebaseClient> {
        &self.auth_service
    }

    fn user_service(&self) -> &UserService<FirebaseClient> {
        &self.user_service
    }

    fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        self.metrics_handle.as_ref()
    }
}

impl AppState {
    /// Wire the provider client, gates and services from configuration
    pub fn from_config(config: Config, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        let provider = Arc::new(FirebaseClient::new(config.firebase.clone())?);
        info!(
            project_id = %provider.project_id(),
            emulator = config.firebase.is_emulator(),
            "Identity provider client initialized"
        );

        let roles = role_source_from_config(&config.roles);
        let auth_gate = AuthGate::new(provider.clone());

        Ok(Self {
            admin_gate: AdminGate::new(auth_gate.clone()),
            auth_gate,
            auth_service: Arc::new(AuthService::new(provider.clone(), roles.clone())),
            user_service: Arc::new(UserService::new(provider, roles)),
            config: Arc::new(config),
            metrics_handle,
        })
    }
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: Config, metrics_handle: Option<PrometheusHandle>) -> Result<()> {
    let http_addr = config.http_addr();
    let state = AppState::from_config(config, metrics_handle)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the HTTP router with generic state type
///
/// Works with both production `AppState` and test implementations of
/// `HasServices`.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = cors_layer(&state.config().cors);

    let user_routes = Router::new()
        .route(
            "/users/me",
            get(api::user::get_me::<S>).put(api::user::update_me::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<S>,
        ));

    let admin_routes = Router::new()
        .route(
            "/admin/users/{uid}",
            get(api::admin::get_user::<S>).delete(api::admin::delete_user::<S>),
        )
        .route("/admin/users/{uid}/claims", put(api::admin::set_claims::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<S>,
        ));

    Router::new()
        .route("/", get(api::root::<S>))
        .route("/health", get(api::health::health))
        .route("/metrics", get(api::metrics::metrics_handler::<S>))
        .route("/auth/register", post(api::auth::register::<S>))
        .route("/auth/token", post(api::auth::token::<S>))
        .route("/auth/login", post(api::auth::login::<S>))
        .merge(user_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(normalize_error_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(ObservabilityLayer)
        .with_state(state)
}
