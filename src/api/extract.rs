//! Body extraction helpers
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (or the form equivalent)
//! and pass it through here, so malformed bodies surface as
//! `AppError::BadRequest` instead of the framework's 415/422 responses.

use crate::error::AppError;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::{Form, Json};

const INVALID_BODY: &str = "Invalid request body";

/// Unwrap a JSON body, mapping deserialization errors to `BadRequest`
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|err| {
        tracing::debug!("Rejected JSON body: {}", err.body_text());
        AppError::BadRequest(INVALID_BODY.to_string())
    })
}

/// Unwrap a URL-encoded form body, mapping deserialization errors to `BadRequest`
pub fn extract_form<T>(result: Result<Form<T>, FormRejection>) -> Result<T, AppError> {
    result.map(|Form(v)| v).map_err(|err| {
        tracing::debug!("Rejected form body: {}", err.body_text());
        AppError::BadRequest(INVALID_BODY.to_string())
    })
}
