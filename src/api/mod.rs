mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use middleware::AuthConfig;

/// Router without authentication, for local use and tests.
pub fn create_router(db: Database) -> Router {
    create_router_with_auth(db, AuthConfig::disabled())
}

pub fn create_router_with_auth(db: Database, auth: AuthConfig) -> Router {
    let api = Router::new()
        // Saved filters
        .route("/saved-filters", get(handlers::list_saved_filters))
        .route("/saved-filters", post(handlers::create_saved_filter))
        .route("/saved-filters/filter", put(handlers::update_saved_filter))
        .route("/saved-filters/filter", delete(handlers::delete_saved_filter))
        .route("/saved-filters/reorder", post(handlers::reorder_saved_filters))
        // Articles
        .route("/articles/filter", post(handlers::filter_articles))
        // Rules
        .route("/rules/apply", post(handlers::apply_rule))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(from_fn_with_state(auth, middleware::require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
