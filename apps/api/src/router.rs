use std::sync::Arc;

use axum::{
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use dentist_cell::router::dentist_routes;
use review_cell::router::{dentist_review_routes, review_routes};
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "DentalCare API is running!" }))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes(state.clone()))
        // Review reads hang off the public dentist directory
        .nest(
            "/dentists",
            dentist_routes(state.clone()).merge(dentist_review_routes(state.clone())),
        )
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/schedules", schedule_routes(state.clone()))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
