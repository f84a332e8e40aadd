//! REST API handlers and shared response types

pub mod admin;
pub mod auth;
pub mod extract;
pub mod health;
pub mod metrics;
pub mod user;

use crate::state::HasServices;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Message response (for delete, claims updates, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Service metadata returned by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub app_name: String,
    pub version: String,
    pub environment: String,
}

pub async fn root<S: HasServices>(State(state): State<S>) -> Json<ServiceInfo> {
    let config = state.config();
    Json(ServiceInfo {
        app_name: config.app_name.clone(),
        version: config.version.clone(),
        environment: config.environment_label().to_string(),
    })
}
