//! Health and service metadata tests

use super::{build_test_router, create_test_config, get_json, TestAppState};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use ridercritic_core::api::ServiceInfo;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_is_static_and_skips_provider() {
    let state = TestAppState::new();
    state.provider.set_unavailable(true);
    let app = build_test_router(state.clone());

    let (status, body): (StatusCode, Option<Value>) = get_json(&app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({"status": "healthy"}));
    assert_eq!(state.provider.call_count(), 0);
}

#[tokio::test]
async fn test_root_reports_service_info() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<ServiceInfo>) = get_json(&app, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    let info = body.unwrap();
    assert_eq!(info.app_name, "RiderCritic");
    assert_eq!(info.version, "1.0.0");
    assert_eq!(info.environment, "test");
}

#[tokio::test]
async fn test_root_reports_development_in_debug_mode() {
    let mut config = create_test_config();
    config.debug = true;
    let app = build_test_router(TestAppState::with_config(config));

    let (_, body): (StatusCode, Option<ServiceInfo>) = get_json(&app, "/", None).await;

    assert_eq!(body.unwrap().environment, "development");
}

#[tokio::test]
async fn test_metrics_disabled_returns_404() {
    let app = build_test_router(TestAppState::new());

    let (status, _): (StatusCode, Option<Value>) = get_json(&app, "/metrics", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) = get_json(&app, "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["error"], "not_found");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    use axum::http::Request;
    use tower::ServiceExt;

    let app = build_test_router(TestAppState::new());
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
}
