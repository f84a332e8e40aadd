//! Administrator endpoints
//!
//! Every handler takes `AdminUser`, so the admin claim is checked before
//! any provider call is made.

use super::extract::extract_json;
use super::MessageResponse;
use crate::domain::UserProfile;
use crate::error::Result;
use crate::middleware::AdminUser;
use crate::state::HasServices;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

/// GET /admin/users/{uid}
pub async fn get_user<S: HasServices>(
    State(state): State<S>,
    AdminUser(_admin): AdminUser,
    Path(uid): Path<String>,
) -> Result<Json<UserProfile>> {
    let profile = state.user_service().get_user(&uid).await?;
    Ok(Json(profile))
}

/// DELETE /admin/users/{uid}
pub async fn delete_user<S: HasServices>(
    State(state): State<S>,
    AdminUser(admin): AdminUser,
    Path(uid): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.user_service().delete_user(&uid).await?;
    tracing::info!(admin = %admin.subject(), uid = %uid, "Admin deleted user");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// PUT /admin/users/{uid}/claims
pub async fn set_claims<S: HasServices>(
    State(state): State<S>,
    AdminUser(admin): AdminUser,
    Path(uid): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let claims = extract_json(body)?;
    state.user_service().set_custom_claims(&uid, claims).await?;
    tracing::info!(admin = %admin.subject(), uid = %uid, "Admin updated custom claims");
    Ok(Json(MessageResponse::new("Custom claims updated successfully")))
}
