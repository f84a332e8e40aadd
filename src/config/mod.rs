//! Configuration management for RiderCritic Core

use anyhow::{Context, Result};
use std::env;

/// Default Identity Toolkit endpoint
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";

/// Public keys used to sign Firebase ID tokens
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name reported by `GET /`
    pub app_name: String,
    /// Application version reported by `GET /`
    pub version: String,
    /// Deployment environment ("development", "production", ...)
    pub environment: String,
    /// Debug mode forces the reported environment to "development"
    pub debug: bool,
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Firebase / identity provider configuration
    pub firebase: FirebaseConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Role sourcing configuration
    pub roles: RoleConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Web API key, required for password sign-in
    pub api_key: String,
    /// Path to the service-account JSON file
    pub credentials_path: String,
    /// Auth emulator `host:port`. When set, admin calls and tokens are unsigned.
    pub emulator_host: Option<String>,
    /// Identity Toolkit base URL (without `/v1`)
    pub identity_toolkit_url: String,
    /// JWKS document with the ID-token signing keys
    pub jwks_url: String,
    /// Timeout applied to every outbound provider request
    pub timeout_secs: u64,
}

impl FirebaseConfig {
    pub fn is_emulator(&self) -> bool {
        self.emulator_host.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins; a single "*" allows any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Where profile roles come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSourceKind {
    /// Always the configured default roles
    Static,
    /// The `roles` custom claim, falling back to the defaults
    CustomClaims,
}

impl std::str::FromStr for RoleSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "custom_claims" | "claims" => Ok(Self::CustomClaims),
            other => Err(anyhow::anyhow!("Unknown role source '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleConfig {
    pub source: RoleSourceKind,
    pub default_roles: Vec<String>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            source: RoleSourceKind::Static,
            default_roles: vec!["user".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "pretty" or "json"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let default_roles = split_list(
            &env::var("DEFAULT_ROLES").unwrap_or_else(|_| "user".to_string()),
        );

        Ok(Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "RiderCritic".to_string()),
            version: env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            debug: env::var("DEBUG").map(|v| parse_bool(&v)).unwrap_or(false),
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            firebase: FirebaseConfig {
                project_id: env::var("FIREBASE_PROJECT_ID")
                    .context("FIREBASE_PROJECT_ID is required")?,
                api_key: env::var("FIREBASE_API_KEY").context("FIREBASE_API_KEY is required")?,
                credentials_path: env::var("GOOGLE_APPLICATION_CREDENTIALS")
                    .unwrap_or_else(|_| "config/firebase-credentials.json".to_string()),
                emulator_host: env::var("FIREBASE_AUTH_EMULATOR_HOST")
                    .ok()
                    .filter(|h| !h.trim().is_empty()),
                identity_toolkit_url: env::var("IDENTITY_TOOLKIT_URL")
                    .unwrap_or_else(|_| DEFAULT_IDENTITY_TOOLKIT_URL.to_string()),
                jwks_url: env::var("FIREBASE_JWKS_URL")
                    .unwrap_or_else(|_| DEFAULT_JWKS_URL.to_string()),
                timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid PROVIDER_TIMEOUT_SECS")?,
            },
            cors: CorsConfig {
                allowed_origins: split_list(
                    &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
            },
            roles: RoleConfig {
                source: env::var("ROLE_SOURCE")
                    .unwrap_or_else(|_| "static".to_string())
                    .parse()
                    .context("Invalid ROLE_SOURCE")?,
                default_roles: if default_roles.is_empty() {
                    vec!["user".to_string()]
                } else {
                    default_roles
                },
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|v| parse_bool(&v))
                    .unwrap_or(true),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Environment label reported to clients
    pub fn environment_label(&self) -> &str {
        if self.debug {
            "development"
        } else {
            &self.environment
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
