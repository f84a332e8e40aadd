//! Profile HTTP handler tests

use super::{build_test_router, get_json, put_json, TestAppState, USER_TOKEN};
use crate::api::create_test_user;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use ridercritic_core::domain::{Claims, UserProfile};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn state_with_user() -> TestAppState {
    let state = TestAppState::new().with_tokens("abc").await;
    state
        .provider
        .add_user(create_test_user("abc", "rider@example.com"), "secret1")
        .await;
    state
}

// ============================================================================
// Authentication gate
// ============================================================================

#[tokio::test]
async fn test_missing_authorization_returns_401_without_provider_call() {
    let state = state_with_user().await;
    let app = build_test_router(state.clone());

    let (status, body): (StatusCode, Option<Value>) = get_json(&app, "/users/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["message"], "Not authenticated");
    assert_eq!(state.provider.call_count(), 0);
}

#[tokio::test]
async fn test_non_bearer_scheme_returns_403() {
    let state = state_with_user().await;
    let app = build_test_router(state.clone());

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Basic xyz")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.provider.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_token_returns_401_without_profile() {
    let app = build_test_router(state_with_user().await);

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Bearer expired-token")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], "Invalid authentication credentials");
    assert!(body.get("uid").is_none());
    assert!(body.get("email").is_none());
}

// ============================================================================
// GET /users/me
// ============================================================================

#[tokio::test]
async fn test_get_me_returns_profile() {
    let state = state_with_user().await;
    let app = build_test_router(state.clone());

    let (status, body): (StatusCode, Option<UserProfile>) =
        get_json(&app, "/users/me", Some(USER_TOKEN)).await;

    assert_eq!(status, StatusCode::OK);
    let profile = body.unwrap();
    assert_eq!(profile.uid, "abc");
    assert_eq!(profile.email.as_deref(), Some("rider@example.com"));
    assert_eq!(profile.roles, vec!["user".to_string()]);
    // verify_token once, get_user once
    assert_eq!(state.provider.call_count(), 2);
}

#[tokio::test]
async fn test_get_me_is_stable() {
    let app = build_test_router(state_with_user().await);

    let (_, first): (StatusCode, Option<UserProfile>) =
        get_json(&app, "/users/me", Some(USER_TOKEN)).await;
    let (_, second): (StatusCode, Option<UserProfile>) =
        get_json(&app, "/users/me", Some(USER_TOKEN)).await;

    assert_eq!(first.unwrap(), second.unwrap());
}

#[tokio::test]
async fn test_get_me_for_deleted_account_returns_404() {
    let state = TestAppState::new();
    state
        .provider
        .add_token("orphan-token", Claims::new("gone"))
        .await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<Value>) =
        get_json(&app, "/users/me", Some("orphan-token")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["error"], "not_found");
}

// ============================================================================
// PUT /users/me
// ============================================================================

#[tokio::test]
async fn test_update_me_changes_only_given_fields() {
    let state = state_with_user().await;
    let app = build_test_router(state.clone());

    let (_, before): (StatusCode, Option<UserProfile>) =
        get_json(&app, "/users/me", Some(USER_TOKEN)).await;
    let before = before.unwrap();

    let (status, body): (StatusCode, Option<UserProfile>) =
        put_json(&app, "/users/me", Some(USER_TOKEN), &json!({"display_name": "X"})).await;

    assert_eq!(status, StatusCode::OK);
    let after = body.unwrap();
    assert_eq!(after.display_name.as_deref(), Some("X"));
    assert_eq!(
        UserProfile {
            display_name: before.display_name.clone(),
            ..after.clone()
        },
        before
    );
}

#[tokio::test]
async fn test_update_me_empty_body_returns_current_profile() {
    let app = build_test_router(state_with_user().await);

    let (status, body): (StatusCode, Option<UserProfile>) =
        put_json(&app, "/users/me", Some(USER_TOKEN), &json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().display_name.as_deref(), Some("Test Rider"));
}

#[tokio::test]
async fn test_update_me_email_taken_returns_400() {
    let state = state_with_user().await;
    state
        .provider
        .add_user(create_test_user("other", "taken@example.com"), "secret1")
        .await;
    let app = build_test_router(state);

    let (status, _): (StatusCode, Option<Value>) = put_json(
        &app,
        "/users/me",
        Some(USER_TOKEN),
        &json!({"email": "taken@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_me_wrong_field_type_returns_400() {
    let app = build_test_router(state_with_user().await);

    let (status, body): (StatusCode, Option<Value>) =
        put_json(&app, "/users/me", Some(USER_TOKEN), &json!({"display_name": 5})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["message"], "Invalid request body");
}

#[tokio::test]
async fn test_update_me_requires_auth_before_body_parsing() {
    let state = state_with_user().await;
    let app = build_test_router(state.clone());

    let request = Request::builder()
        .method("PUT")
        .uri("/users/me")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{broken"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_provider_outage_during_verification_returns_401() {
    let state = state_with_user().await;
    let app = build_test_router(state.clone());
    state.provider.set_unavailable(true);

    let (status, _): (StatusCode, Option<Value>) =
        get_json(&app, "/users/me", Some(USER_TOKEN)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
