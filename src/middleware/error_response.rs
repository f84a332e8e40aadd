//! Error response normalization middleware
//!
//! Framework rejections (malformed JSON or form bodies, unknown routes, wrong
//! methods) are plain text by default. This rewrites them into the same
//! `{error, message}` JSON body that `AppError` produces, without echoing
//! parser details back to clients.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Paths whose responses are passed through untouched
const PASSTHROUGH_PATHS: &[&str] = &["/health", "/metrics"];

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let passthrough = PASSTHROUGH_PATHS.contains(&request.uri().path());
    let response = next.run(request).await;

    let status = response.status();
    if passthrough || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if is_json {
        return response;
    }

    generic_error_response(status)
}

fn generic_error_response(status: StatusCode) -> Response {
    let (error_type, message) = match status {
        StatusCode::BAD_REQUEST => ("bad_request", "Invalid request body"),
        StatusCode::UNAUTHORIZED => ("unauthorized", "Authentication required"),
        StatusCode::FORBIDDEN => ("forbidden", "Access denied"),
        StatusCode::NOT_FOUND => ("not_found", "Not found"),
        StatusCode::METHOD_NOT_ALLOWED => ("method_not_allowed", "Method not allowed"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ("unsupported_media_type", "Unsupported content type")
        }
        StatusCode::PAYLOAD_TOO_LARGE => ("payload_too_large", "Request body too large"),
        _ if status.is_client_error() => ("client_error", "Client error"),
        _ => ("internal_error", "An internal error occurred"),
    };

    (
        status,
        axum::Json(json!({
            "error": error_type,
            "message": message,
        })),
    )
        .into_response()
}
