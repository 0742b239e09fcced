use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{auth, catalog, favorites, handlers, profile, reviews, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog
        .route("/catalog", get(catalog::list_catalog))
        .route("/catalog/facets", get(catalog::get_facets))
        .route("/catalog/{id}", get(catalog::get_item))
        // Reviews
        .route(
            "/catalog/{id}/reviews",
            get(reviews::list_reviews).post(reviews::submit_review),
        )
        .route("/reviews/{id}", delete(reviews::delete_review))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        // Profile and favorites
        .route(
            "/me",
            get(profile::get_profile)
                .patch(profile::update_profile)
                .delete(profile::delete_profile),
        )
        .route("/me/favorites", get(favorites::list_favorites))
        .route(
            "/me/favorites/{id}",
            put(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        // Live updates
        .route("/ws/catalog/{id}/reviews", get(ws::reviews_ws))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
