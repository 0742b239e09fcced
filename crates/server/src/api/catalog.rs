//! Catalog API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use phonelist_core::{CatalogItem, Facets, FilterParams};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::extract::ApiQuery;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Search text; filter constraints are read from the same query string
/// into [`FilterParams`].
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive name substring.
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub items: Vec<CatalogItem>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/catalog
///
/// The catalog narrowed by the search query and filter constraints.
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    ApiQuery(search): ApiQuery<SearchQuery>,
    ApiQuery(filters): ApiQuery<FilterParams>,
) -> ApiResult<Json<CatalogListResponse>> {
    let catalog = state.catalog().load().await?;
    let query = search.query.unwrap_or_default();
    let items = state.filter_engine().filter(&catalog, &query, &filters);

    Ok(Json(CatalogListResponse {
        total: items.len(),
        items: items.as_ref().clone(),
    }))
}

/// GET /api/v1/catalog/facets
pub async fn get_facets(State(state): State<Arc<AppState>>) -> ApiResult<Json<Facets>> {
    let catalog = state.catalog().load().await?;
    let facets = state.filter_engine().facets(&catalog);
    Ok(Json(facets.as_ref().clone()))
}

/// GET /api/v1/catalog/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CatalogItem>> {
    state.catalog().load().await?;
    state
        .catalog()
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Catalog item not found: {}", id)))
}
