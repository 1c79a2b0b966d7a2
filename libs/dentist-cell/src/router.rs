use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn dentist_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(handlers::search_dentists))
        .route("/{dentist_id}", get(handlers::get_dentist));

    // Directory management (admin only, enforced in handlers)
    let protected_routes = Router::new()
        .route("/", post(handlers::create_dentist))
        .route("/{dentist_id}", put(handlers::update_dentist))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
