//! Authentication handlers

use axum::{extract::State, Json};
use serde::Deserialize;

use shared::models::User;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, AuthTokens, RegisterInput, RegisterResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new dashboard user
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<RegisterResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let response = service.register(input).await?;
    Ok(Json(response))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for new tokens
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(Json(tokens))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let user = service.get_user(current_user.0.user_id).await?;
    Ok(Json(user))
}
