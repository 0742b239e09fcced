//! The signed-in user's profile document.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use phonelist_core::{ProfileUpdate, UserProfile};

use super::error::{ApiError, ApiResult};
use super::extract::ApiJson;
use super::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/v1/me
///
/// Creates the document on first access.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.profiles().ensure_profile(&user.0).await?;
    Ok(Json(profile))
}

/// PATCH /api/v1/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<UserProfile>> {
    if update.is_empty() {
        return Err(ApiError::bad_request("No profile fields to update"));
    }
    state
        .profiles()
        .update(user.user_id(), &update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Profile not found: {}", user.user_id())))
}

/// DELETE /api/v1/me
///
/// Deletes the profile document and the account.
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<StatusCode> {
    state.profiles().delete_account(&user.session()).await?;
    Ok(StatusCode::NO_CONTENT)
}
