use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

// Framework body cap for uploads. Sits above the 2MB image limit, which the
// handler enforces with a proper error response.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/password-reset", post(handlers::request_password_reset))
        .route(
            "/password-reset/confirm",
            post(handlers::confirm_password_reset),
        );

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me))
        .route("/profile", put(handlers::update_profile))
        .route(
            "/upload-profile-picture",
            post(handlers::upload_profile_picture)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
