//! Registration and login HTTP handler tests

use super::{build_test_router, post_form, post_json, TestAppState};
use crate::api::create_test_user;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use ridercritic_core::domain::{TokenResponse, UserProfile};
use rstest::rstest;
use serde_json::{json, Value};

// ============================================================================
// Register
// ============================================================================

#[tokio::test]
async fn test_register_returns_201_with_default_roles() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, body): (StatusCode, Option<UserProfile>) = post_json(
        &app,
        "/auth/register",
        &json!({"email": "a@b.com", "password": "abcdef"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let profile = body.unwrap();
    assert_eq!(profile.email.as_deref(), Some("a@b.com"));
    assert_eq!(profile.roles, vec!["user".to_string()]);
    assert!(!profile.email_verified);
    assert!(state.provider.user(&profile.uid).await.is_some());
}

#[tokio::test]
async fn test_register_keeps_optional_profile_fields() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<UserProfile>) = post_json(
        &app,
        "/auth/register",
        &json!({
            "email": "rider@example.com",
            "password": "abcdef",
            "display_name": "Rider",
            "photo_url": "https://example.com/me.png"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let profile = body.unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Rider"));
    assert_eq!(profile.photo_url.as_deref(), Some("https://example.com/me.png"));
}

#[rstest]
#[case::short_password(json!({"email": "a@b.com", "password": "abcde"}))]
#[case::bad_email(json!({"email": "not-an-email", "password": "abcdef"}))]
#[case::bad_photo_url(json!({"email": "a@b.com", "password": "abcdef", "photo_url": "nope"}))]
#[tokio::test]
async fn test_register_validation_happens_before_provider(#[case] body: Value) {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, response): (StatusCode, Option<Value>) =
        post_json(&app, "/auth/register", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.unwrap()["error"], "bad_request");
    assert_eq!(state.provider.call_count(), 0);
}

#[rstest]
#[case::missing_password(json!({"email": "a@b.com"}))]
#[case::numeric_password(json!({"email": "a@b.com", "password": 123456}))]
#[case::not_an_object(json!(["a@b.com", "abcdef"]))]
#[tokio::test]
async fn test_register_wrong_body_shape_returns_400(#[case] body: Value) {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, response): (StatusCode, Option<Value>) =
        post_json(&app, "/auth/register", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let response = response.unwrap();
    assert_eq!(response["error"], "bad_request");
    assert_eq!(response["message"], "Invalid request body");
    assert_eq!(state.provider.call_count(), 0);
}

#[tokio::test]
async fn test_login_wrong_body_shape_returns_400() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) =
        post_json(&app, "/auth/login", &json!({"email": "a@b.com"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "bad_request");
}

#[tokio::test]
async fn test_register_duplicate_email_returns_409() {
    let state = TestAppState::new();
    state
        .provider
        .add_user(create_test_user("abc", "a@b.com"), "abcdef")
        .await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/auth/register",
        &json!({"email": "a@b.com", "password": "abcdef"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["error"], "conflict");
}

#[tokio::test]
async fn test_register_malformed_json_returns_json_error() {
    let app = build_test_router(TestAppState::new());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"email\":"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], "Invalid request body");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_token_endpoint_issues_bearer_token() {
    let state = TestAppState::new();
    state
        .provider
        .add_user(create_test_user("abc", "rider@example.com"), "secret1")
        .await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<TokenResponse>) = post_form(
        &app,
        "/auth/token",
        "grant_type=password&username=rider%40example.com&password=secret1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body.unwrap();
    assert_eq!(token.token_type, "bearer");
    assert_eq!(token.access_token, "custom-token-for-abc");
}

#[tokio::test]
async fn test_token_endpoint_wrong_password_returns_401() {
    let state = TestAppState::new();
    state
        .provider
        .add_user(create_test_user("abc", "rider@example.com"), "secret1")
        .await;
    let app = build_test_router(state);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(
            "username=rider%40example.com&password=wrong",
        ))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], "Incorrect email or password");
}

#[tokio::test]
async fn test_token_endpoint_unknown_email_matches_wrong_password() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) = post_form(
        &app,
        "/auth/token",
        "username=ghost%40example.com&password=secret1",
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["message"], "Incorrect email or password");
}

#[tokio::test]
async fn test_token_endpoint_rejects_other_grant_types() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, _): (StatusCode, Option<Value>) = post_form(
        &app,
        "/auth/token",
        "grant_type=client_credentials&username=a%40b.com&password=abcdef",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.provider.call_count(), 0);
}

#[rstest]
#[case::missing_password("username=a%40b.com")]
#[case::missing_username("password=abcdef")]
#[case::empty_form("")]
#[tokio::test]
async fn test_token_endpoint_missing_credentials_returns_401(#[case] form: &str) {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let (status, body): (StatusCode, Option<Value>) = post_form(&app, "/auth/token", form).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["message"], "Incorrect email or password");
    assert_eq!(state.provider.call_count(), 0);
}

#[tokio::test]
async fn test_json_login() {
    let state = TestAppState::new();
    state
        .provider
        .add_user(create_test_user("abc", "rider@example.com"), "secret1")
        .await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<TokenResponse>) = post_json(
        &app,
        "/auth/login",
        &json!({"email": "rider@example.com", "password": "secret1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().access_token, "custom-token-for-abc");
}

#[tokio::test]
async fn test_login_provider_outage_returns_500() {
    let state = TestAppState::new();
    state.provider.set_unavailable(true);
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/auth/login",
        &json!({"email": "rider@example.com", "password": "secret1"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.unwrap()["message"], "An internal error occurred");
}
