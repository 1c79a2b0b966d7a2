use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    CreateDentistRequest, DentistError, DentistSearchFilters, UpdateDentistRequest,
};
use crate::services::DentistDirectoryService;

#[derive(Debug, Deserialize)]
pub struct DentistSearchQuery {
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub accepting_new_patients: Option<bool>,
    pub min_rating: Option<f32>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn search_dentists(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DentistSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DentistDirectoryService::new(&state);

    let filters = DentistSearchFilters {
        specialty: query.specialty,
        city: query.city,
        accepting_new_patients: query.accepting_new_patients,
        min_rating: query.min_rating,
    };

    let dentists = service
        .search_dentists(filters, query.limit, query.offset)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "dentists": dentists,
        "total": dentists.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dentist(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = DentistDirectoryService::new(&state);

    let dentist = service.get_dentist(&dentist_id).await.map_err(|e| match e {
        DentistError::NotFound => AppError::NotFound("Dentist not found".to_string()),
        other => AppError::Database(other.to_string()),
    })?;

    Ok(Json(json!(dentist)))
}

// ==============================================================================
// PROTECTED DIRECTORY MANAGEMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_dentist(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDentistRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // Directory entries are curated by administrators.
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Auth(
            "Only administrators can create dentist entries".to_string(),
        ));
    }

    let service = DentistDirectoryService::new(&state);

    let dentist = service
        .create_dentist(request, auth.token())
        .await
        .map_err(|e| match e {
            DentistError::DuplicateEmail => {
                AppError::Conflict("A dentist with this email already exists".to_string())
            }
            DentistError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(json!(dentist))))
}

#[axum::debug_handler]
pub async fn update_dentist(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDentistRequest>,
) -> Result<Json<Value>, AppError> {
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Auth(
            "Only administrators can update dentist entries".to_string(),
        ));
    }

    let service = DentistDirectoryService::new(&state);

    let updated = service
        .update_dentist(&dentist_id, request, auth.token())
        .await
        .map_err(|e| match e {
            DentistError::NotFound => AppError::NotFound("Dentist not found".to_string()),
            DentistError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(updated)))
}
