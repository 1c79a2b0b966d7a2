use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use dentist_cell::models::DentistError;
use dentist_cell::services::DentistDirectoryService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{DayOffRequest, ScheduleError, UpdateScheduleRequest};
use crate::services::ScheduleService;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub time: String,
}

fn can_manage_schedules(user: &User) -> bool {
    matches!(user.role.as_deref(), Some("dentist") | Some("admin"))
}

async fn ensure_dentist_exists(state: &AppConfig, dentist_id: &str) -> Result<(), AppError> {
    DentistDirectoryService::new(state)
        .get_dentist(dentist_id)
        .await
        .map(|_| ())
        .map_err(|e| match e {
            DentistError::NotFound => AppError::NotFound("Dentist not found".to_string()),
            other => AppError::Database(other.to_string()),
        })
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_dentist_exists(&state, &dentist_id).await?;

    let schedule = ScheduleService::new(&state)
        .get_schedule(&dentist_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_dentist_exists(&state, &dentist_id).await?;

    let check = ScheduleService::new(&state)
        .check_availability(&dentist_id, query.date, &query.time)
        .await
        .map_err(|e| match e {
            ScheduleError::InvalidTime(t) => {
                AppError::BadRequest(format!("Invalid time: {}", t))
            }
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!({
        "dentist_id": dentist_id,
        "date": query.date,
        "time": query.time,
        "available": check.available,
        "reason": check.reason
    })))
}

// ==============================================================================
// PROTECTED SCHEDULE MANAGEMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    if !can_manage_schedules(&user) {
        return Err(AppError::Auth(
            "Only dentists or administrators can manage schedules".to_string(),
        ));
    }

    ensure_dentist_exists(&state, &dentist_id).await?;

    let schedule = ScheduleService::new(&state)
        .update_working_hours(&dentist_id, request.working_hours, auth.token())
        .await
        .map_err(|e| match e {
            ScheduleError::InvalidTime(msg) => {
                AppError::BadRequest(format!("Invalid time: {}", msg))
            }
            ScheduleError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn add_day_off(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<DayOffRequest>,
) -> Result<Json<Value>, AppError> {
    if !can_manage_schedules(&user) {
        return Err(AppError::Auth(
            "Only dentists or administrators can manage schedules".to_string(),
        ));
    }

    ensure_dentist_exists(&state, &dentist_id).await?;

    let schedule = ScheduleService::new(&state)
        .add_day_off(&dentist_id, request.date, auth.token())
        .await
        .map_err(|e| match e {
            ScheduleError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn remove_day_off(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<DayOffRequest>,
) -> Result<Json<Value>, AppError> {
    if !can_manage_schedules(&user) {
        return Err(AppError::Auth(
            "Only dentists or administrators can manage schedules".to_string(),
        ));
    }

    ensure_dentist_exists(&state, &dentist_id).await?;

    let schedule = ScheduleService::new(&state)
        .remove_day_off(&dentist_id, request.date, auth.token())
        .await
        .map_err(|e| match e {
            ScheduleError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(schedule)))
}
