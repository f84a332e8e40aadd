//! Common test utilities
//!
//! `MockIdentityToolkit` stands in for the Firebase Auth emulator so the real
//! `FirebaseClient` can be driven over HTTP.

use ridercritic_core::config::{FirebaseConfig, DEFAULT_IDENTITY_TOOLKIT_URL, DEFAULT_JWKS_URL};
use ridercritic_core::identity::FirebaseClient;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: &str = "ridercritic-test";
pub const API_KEY: &str = "test-api-key";

/// Emulator-shaped Identity Toolkit backed by wiremock
pub struct MockIdentityToolkit {
    pub server: MockServer,
}

impl MockIdentityToolkit {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn config(&self) -> FirebaseConfig {
        let host = self
            .server
            .uri()
            .trim_start_matches("http://")
            .to_string();

        FirebaseConfig {
            project_id: PROJECT_ID.to_string(),
            api_key: API_KEY.to_string(),
            credentials_path: "/nonexistent/firebase-credentials.json".to_string(),
            emulator_host: Some(host),
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            timeout_secs: 5,
        }
    }

    pub fn client(&self) -> FirebaseClient {
        FirebaseClient::new(self.config()).unwrap()
    }

    /// Path of a project-scoped admin method, e.g. `accounts:lookup`
    pub fn admin_path(method: &str) -> String {
        format!(
            "/identitytoolkit.googleapis.com/v1/projects/{}/{}",
            PROJECT_ID, method
        )
    }

    pub fn public_path(method: &str) -> String {
        format!("/identitytoolkit.googleapis.com/v1/{}", method)
    }

    /// Answer `accounts:lookup` with the given users
    pub async fn mock_lookup(&self, users: Vec<Value>) {
        Mock::given(method("POST"))
            .and(path(Self::admin_path("accounts:lookup")))
            .and(header("authorization", "Bearer owner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "identitytoolkit#GetAccountInfoResponse",
                "users": users
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer `method_path` with an Identity Toolkit error envelope
    pub async fn mock_error(&self, method_path: String, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(method_path))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {
                    "code": status,
                    "message": message,
                    "errors": [{ "message": message, "domain": "global", "reason": "invalid" }]
                }
            })))
            .mount(&self.server)
            .await;
    }
}

/// `UserInfo` payload the way the emulator returns it
pub fn user_info(uid: &str, email: &str) -> Value {
    json!({
        "localId": uid,
        "email": email,
        "displayName": "Test Rider",
        "photoUrl": "https://example.com/rider.png",
        "emailVerified": true,
        "disabled": false,
        "createdAt": "1700000000000",
        "lastLoginAt": "1700000500000",
        "lastRefreshAt": "2023-11-14T22:21:40.000Z",
        "providerUserInfo": []
    })
}
