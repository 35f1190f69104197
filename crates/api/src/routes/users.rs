//! Profile routes for the signed-in user.

use axum::{Json, extract::State};
use tracing::instrument;

use super::{ApiJson, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthService, PasswordChange, ProfileUpdate};
use crate::state::AppState;

/// `GET /api/users/profile`
#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    let user = AuthService::new(state.store(), state.tokens())
        .profile(user)
        .await?;
    Ok(Json(user))
}

/// `PUT /api/users/profile`
#[instrument(skip(state, update))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.store(), state.tokens())
        .update_profile(user, &update)
        .await?;
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

/// `PUT /api/users/password`
#[instrument(skip(state, change))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.store(), state.tokens())
        .change_password(user, &change)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
