//! Registration and login.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use super::ApiJson;
use crate::error::Result;
use crate::models::User;
use crate::services::auth::{AuthService, LoginInput, RegisterInput};
use crate::state::AppState;

/// Token plus the signed-in user.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = AuthService::new(state.store(), state.tokens())
        .register(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<AuthResponse>> {
    let (user, token) = AuthService::new(state.store(), state.tokens())
        .login(&input)
        .await?;
    Ok(Json(AuthResponse { token, user }))
}
