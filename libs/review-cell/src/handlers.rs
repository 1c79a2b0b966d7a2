use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    CreateReviewRequest, RespondToReviewRequest, ReviewError, SetVisibilityRequest,
};
use crate::services::ReviewService;

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_dentist_reviews(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&state);

    let reviews = service
        .get_reviews_for_dentist(&dentist_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let total = reviews.len();
    Ok(Json(json!({
        "reviews": reviews,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn get_dentist_rating(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&state);

    let summary = service
        .get_rating_summary(&dentist_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "dentist_id": dentist_id,
        "average": summary.average,
        "count": summary.count
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ReviewService::new(&state);

    let review = service
        .create_review(request, &user, auth.token())
        .await
        .map_err(|e| match e {
            ReviewError::DentistNotFound => AppError::NotFound("Dentist not found".to_string()),
            ReviewError::NoAppointmentHistory => AppError::BadRequest(
                "You can only review dentists you have had an appointment with".to_string(),
            ),
            ReviewError::DuplicateReview => {
                AppError::Conflict("You have already reviewed this dentist".to_string())
            }
            ReviewError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(json!(review))))
}

#[axum::debug_handler]
pub async fn respond_to_review(
    State(state): State<Arc<AppConfig>>,
    Path(review_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RespondToReviewRequest>,
) -> Result<Json<Value>, AppError> {
    if user.role.as_deref() != Some("dentist") {
        return Err(AppError::Auth(
            "Only dentists can respond to reviews".to_string(),
        ));
    }

    let service = ReviewService::new(&state);

    let updated = service
        .respond_to_review(&review_id, &request.response, &user, auth.token())
        .await
        .map_err(|e| match e {
            ReviewError::NotFound => AppError::NotFound("Review not found".to_string()),
            ReviewError::NotReviewSubject => AppError::Auth(
                "You can only respond to reviews of your own practice".to_string(),
            ),
            ReviewError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn set_review_visibility(
    State(state): State<Arc<AppConfig>>,
    Path(review_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SetVisibilityRequest>,
) -> Result<Json<Value>, AppError> {
    // Moderation is reserved for administrators.
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Auth(
            "Only administrators can moderate reviews".to_string(),
        ));
    }

    let service = ReviewService::new(&state);

    let updated = service
        .set_review_visibility(&review_id, request.is_visible, auth.token())
        .await
        .map_err(|e| match e {
            ReviewError::NotFound => AppError::NotFound("Review not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(updated)))
}
