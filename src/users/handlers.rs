use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{dto::ProfileResponse, repo::ProfilePatch, services};
use crate::{api::ApiJson, auth::AuthUser, error::AppError, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let found = services::profile(&state, user.user_id).await?;
    Ok(Json(ProfileResponse {
        message: None,
        user: found.into(),
    }))
}

#[instrument(skip(state, user, patch), fields(user_id = user.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<ProfileResponse>, AppError> {
    let updated = services::update_profile(&state, user.user_id, patch).await?;
    Ok(Json(ProfileResponse {
        message: Some("Profile updated successfully"),
        user: updated.into(),
    }))
}
