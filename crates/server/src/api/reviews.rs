//! Review endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use phonelist_core::{MirrorStatus, ReviewCollection, ReviewRecord};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::extract::ApiJson;
use super::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub comment: String,
    pub rating: i32,
}

/// GET /api/v1/catalog/{id}/reviews
///
/// Reviews of the item, oldest first.
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> ApiResult<Json<Vec<ReviewRecord>>> {
    let reviews = state.store().list_for_item(&item_id).await?;
    Ok(Json(reviews))
}

/// POST /api/v1/catalog/{id}/reviews
///
/// Creates the caller's review of the item, or rewrites it when one exists.
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
    ApiJson(body): ApiJson<SubmitReviewRequest>,
) -> ApiResult<Json<ReviewRecord>> {
    let log = state.review_log(user.session());
    log.load(&item_id);
    if let MirrorStatus::Failed(e) = log.wait_synced().await {
        return Err(e.into());
    }

    log.submit(&item_id, &body.comment, body.rating)
        .await?
        .map(Json)
        .ok_or_else(ApiError::unauthorized)
}

/// DELETE /api/v1/reviews/{id}
///
/// Only the author may delete a review.
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(review_id): Path<String>,
) -> ApiResult<StatusCode> {
    let record = state
        .store()
        .get_review(&review_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Review not found: {}", review_id)))?;

    if record.user_id != user.user_id() {
        tracing::debug!(review_id = %review_id, user_id = %user.user_id(), "Rejected delete of another author's review");
        return Err(ApiError::forbidden("Only the author can delete a review"));
    }

    state.review_log(user.session()).delete(&record).await?;
    Ok(StatusCode::NO_CONTENT)
}
