use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Creates the schedule cell router with all schedule endpoints
pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/{dentist_id}", get(handlers::get_schedule))
        .route("/{dentist_id}/availability", get(handlers::check_availability));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/{dentist_id}", put(handlers::update_schedule))
        .route("/{dentist_id}/days-off", post(handlers::add_day_off))
        .route("/{dentist_id}/days-off", delete(handlers::remove_day_off))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    public_routes.merge(protected_routes).with_state(state)
}
