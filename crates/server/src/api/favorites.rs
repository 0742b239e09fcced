//! Favorites of the signed-in user.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use phonelist_core::{join_favorites, CatalogItem, MirrorStatus};

use super::error::{ApiError, ApiResult};
use super::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/v1/me/favorites
///
/// Favorite catalog items in catalog order. Ids no longer in the catalog
/// are skipped.
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<CatalogItem>>> {
    let catalog = state.catalog().load().await?;

    let favorites = state.favorites(user.session());
    favorites.load(user.user_id());
    if let MirrorStatus::Failed(e) = favorites.wait_synced().await {
        return Err(e.into());
    }

    Ok(Json(join_favorites(&catalog, &favorites.current())))
}

/// PUT /api/v1/me/favorites/{id}
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog().load().await?;
    if state.catalog().get(&item_id).is_none() {
        return Err(ApiError::not_found(format!(
            "Catalog item not found: {}",
            item_id
        )));
    }
    state
        .favorites(user.session())
        .add(user.user_id(), &item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/me/favorites/{id}
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .favorites(user.session())
        .remove(user.user_id(), &item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
