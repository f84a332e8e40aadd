//! Registration and login endpoints

use super::extract::{extract_form, extract_json};
use crate::domain::{LoginInput, RegisterInput, TokenRequestForm, TokenResponse, UserProfile};
use crate::error::{AppError, Result};
use crate::state::HasServices;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    Form, Json,
};

/// POST /auth/register
pub async fn register<S: HasServices>(
    State(state): State<S>,
    body: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let input = extract_json(body)?;
    let profile = state.auth_service().register(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /auth/token (OAuth2 password grant, form encoded)
pub async fn token<S: HasServices>(
    State(state): State<S>,
    body: std::result::Result<Form<TokenRequestForm>, FormRejection>,
) -> Result<Json<TokenResponse>> {
    let form = extract_form(body)?;
    if let Some(grant_type) = form.grant_type.as_deref() {
        if !grant_type.is_empty() && grant_type != "password" {
            return Err(AppError::BadRequest(format!(
                "Unsupported grant_type '{}'",
                grant_type
            )));
        }
    }

    let token = state.auth_service().login(form.into()).await?;
    Ok(Json(token))
}

/// POST /auth/login (JSON body)
pub async fn login<S: HasServices>(
    State(state): State<S>,
    body: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let input = extract_json(body)?;
    let token = state.auth_service().login(input).await?;
    Ok(Json(token))
}
