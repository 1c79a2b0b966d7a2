use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Creates the review cell router for writes and moderation.
pub fn review_routes(state: Arc<AppConfig>) -> Router {
    // All review writes require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_review))
        .route("/{review_id}/response", post(handlers::respond_to_review))
        .route("/{review_id}/visibility", put(handlers::set_review_visibility))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

/// Public review reads, nested under the dentist directory.
pub fn dentist_review_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{dentist_id}/reviews", get(handlers::get_dentist_reviews))
        .route("/{dentist_id}/rating", get(handlers::get_dentist_rating))
        .with_state(state)
}
