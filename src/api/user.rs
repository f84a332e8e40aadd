//! Self-service profile endpoints

use super::extract::extract_json;
use crate::domain::{UpdateProfileInput, UserProfile};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

/// GET /users/me
pub async fn get_me<S: HasServices>(
    State(state): State<S>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserProfile>> {
    let profile = state.user_service().get_self(&claims).await?;
    Ok(Json(profile))
}

/// PUT /users/me
pub async fn update_me<S: HasServices>(
    State(state): State<S>,
    AuthUser(claims): AuthUser,
    body: std::result::Result<Json<UpdateProfileInput>, JsonRejection>,
) -> Result<Json<UserProfile>> {
    let input = extract_json(body)?;
    let profile = state.user_service().update_self(&claims, input).await?;
    Ok(Json(profile))
}
