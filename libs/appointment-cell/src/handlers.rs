use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentStatus, BookAppointmentRequest, RescheduleAppointmentRequest,
    UpdateStatusRequest,
};
use crate::services::{AppointmentBookingService, AppointmentLifecycleService};

#[derive(Debug, Deserialize)]
pub struct MyAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .book_appointment(request, &user, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::DentistNotFound => {
                AppError::NotFound("Dentist not found".to_string())
            }
            AppointmentError::ConflictDetected => AppError::Conflict(
                "Appointment slot conflicts with an existing booking".to_string(),
            ),
            AppointmentError::SlotUnavailable(reason) => AppError::BadRequest(reason),
            AppointmentError::InvalidTime(msg) => {
                AppError::BadRequest(format!("Invalid appointment time: {}", msg))
            }
            AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<MyAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointments = service
        .get_appointments_for(&user, query.status, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let total = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    // Only the patient, the booked dentist, or an admin can view
    let is_patient = appointment.patient_id.to_string() == user.id;
    let is_admin = user.role.as_deref() == Some("admin");
    let is_dentist = match service
        .dentist_identity(&user)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
    {
        Some(dentist_id) => appointment.dentist_id == dentist_id,
        None => false,
    };

    if !is_patient && !is_dentist && !is_admin {
        return Err(AppError::Auth(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    apply_status_change(&state, appointment_id, request.status, &user, auth.token()).await
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    apply_status_change(
        &state,
        appointment_id,
        AppointmentStatus::Canceled,
        &user,
        auth.token(),
    )
    .await
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    ensure_party_to_appointment(&service, &appointment, &user).await?;

    let updated = service
        .reschedule_appointment(&appointment, request, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::InvalidStatusTransition(_) => AppError::BadRequest(
                "Only pending or confirmed appointments can be rescheduled".to_string(),
            ),
            AppointmentError::ConflictDetected => AppError::Conflict(
                "Appointment slot conflicts with an existing booking".to_string(),
            ),
            AppointmentError::SlotUnavailable(reason) => AppError::BadRequest(reason),
            AppointmentError::InvalidTime(msg) => {
                AppError::BadRequest(format!("Invalid appointment time: {}", msg))
            }
            AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(updated)))
}

async fn apply_status_change(
    state: &Arc<AppConfig>,
    appointment_id: Uuid,
    new_status: AppointmentStatus,
    user: &User,
    token: &str,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(state);

    let appointment = service
        .get_appointment(appointment_id, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    let role = ensure_party_to_appointment(&service, &appointment, user).await?;

    // Patients can withdraw a booking but not move it along.
    if role == Party::Patient && new_status != AppointmentStatus::Canceled {
        return Err(AppError::Auth(
            "Patients can only cancel appointments".to_string(),
        ));
    }

    AppointmentLifecycleService::new()
        .validate_status_transition(&appointment.status, &new_status)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = service
        .set_status(appointment.id, new_status, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!(updated)))
}

#[derive(PartialEq)]
enum Party {
    Patient,
    Dentist,
    Admin,
}

async fn ensure_party_to_appointment(
    service: &AppointmentBookingService,
    appointment: &crate::models::Appointment,
    user: &User,
) -> Result<Party, AppError> {
    if user.role.as_deref() == Some("admin") {
        return Ok(Party::Admin);
    }

    if let Some(dentist_id) = service
        .dentist_identity(user)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
    {
        if appointment.dentist_id == dentist_id {
            return Ok(Party::Dentist);
        }
    }

    if appointment.patient_id.to_string() == user.id {
        return Ok(Party::Patient);
    }

    Err(AppError::Auth(
        "Not authorized to modify this appointment".to_string(),
    ))
}
