//! Account endpoints: register, sign in, sign out.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use phonelist_core::{Session, SignedIn};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::extract::ApiJson;
use super::middleware::{auth_request, MaybeUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SignedIn>)> {
    let session = Session::signed_out();
    let signed_in = state
        .profiles()
        .register(
            &session,
            &body.email,
            &body.password,
            body.display_name.as_deref(),
        )
        .await?;
    tracing::info!(user_id = %signed_in.identity.user_id, "Registered account");
    Ok((StatusCode::CREATED, Json(signed_in)))
}

/// POST /api/v1/auth/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SignInRequest>,
) -> ApiResult<Json<SignedIn>> {
    let session = Session::signed_out();
    let signed_in = state
        .profiles()
        .sign_in(&session, &body.email, &body.password)
        .await?;
    Ok(Json(signed_in))
}

/// POST /api/v1/auth/sign-out
///
/// Invalidates the bearer token of the request.
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let request = auth_request(&headers);
    let token = request.bearer_token().ok_or_else(ApiError::unauthorized)?;
    state.profiles().sign_out(&user.session(), token).await?;
    Ok(StatusCode::NO_CONTENT)
}
