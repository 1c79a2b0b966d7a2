use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use dentist_cell::models::DentistError;
use dentist_cell::services::DentistDirectoryService;
use schedule_cell::models::ScheduleError;
use schedule_cell::services::ScheduleService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_utils::time::parse_time;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    RescheduleAppointmentRequest, VISIT_LENGTH_MINUTES,
};

pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    dentists: DentistDirectoryService,
    schedules: ScheduleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            dentists: DentistDirectoryService::new(config),
            schedules: ScheduleService::new(config),
        }
    }

    /// Book a visit for the authenticated patient. The slot must lie in the
    /// dentist's working hours and must not collide with another active
    /// booking.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with dentist {}",
            user.id, request.dentist_id
        );

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Reason for the visit is required".to_string(),
            ));
        }

        let dentist = self
            .dentists
            .get_dentist(&request.dentist_id.to_string())
            .await
            .map_err(|e| match e {
                DentistError::NotFound => AppointmentError::DentistNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let slot = self
            .validate_slot(request.dentist_id, request.date, &request.time, None, auth_token)
            .await?;

        let patient_name = self.fetch_patient_name(&user.id, auth_token).await?;

        let appointment_data = json!({
            "dentist_id": request.dentist_id,
            "patient_id": user.id,
            "patient_name": patient_name,
            "dentist_name": dentist.name,
            "date": request.date,
            "time": slot.format("%H:%M").to_string(),
            "status": AppointmentStatus::Pending,
            "reason": request.reason,
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment: Appointment = result
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))?
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        info!("Appointment {} booked successfully", appointment.id);
        Ok(appointment)
    }

    /// Get appointment by ID
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// List the caller's appointments, newest first. Patients see their own
    /// bookings; dentist accounts see the appointments booked with them.
    pub async fn get_appointments_for(
        &self,
        user: &User,
        status: Option<AppointmentStatus>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = match self.dentist_identity(user).await? {
            Some(dentist_id) => format!("dentist_id=eq.{}", dentist_id),
            None => format!("patient_id=eq.{}", user.id),
        };

        let mut path = format!(
            "/rest/v1/appointments?{}&order=date.desc,time.desc",
            filter
        );
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    /// Apply a status change. Transition validity is checked by the caller
    /// through the lifecycle service.
    pub async fn set_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Setting appointment {} to {}", appointment_id, status);

        let update_data = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data, auth_token).await
    }

    /// Move an active appointment to a new slot. The new slot goes through
    /// the same checks as a fresh booking, minus this appointment itself,
    /// and the booking drops back to pending for re-confirmation.
    pub async fn reschedule_appointment(
        &self,
        current: &Appointment,
        request: RescheduleAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment: {}", current.id);

        if !current.status.is_active() {
            return Err(AppointmentError::InvalidStatusTransition(
                current.status.clone(),
            ));
        }

        let slot = self
            .validate_slot(
                current.dentist_id,
                request.date,
                &request.time,
                Some(current.id),
                auth_token,
            )
            .await?;

        let update_data = json!({
            "date": request.date,
            "time": slot.format("%H:%M").to_string(),
            "status": AppointmentStatus::Pending,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(current.id, update_data, auth_token).await
    }

    /// The dentist-directory row backing this user, when they have one.
    pub async fn dentist_identity(
        &self,
        user: &User,
    ) -> Result<Option<Uuid>, AppointmentError> {
        if user.role.as_deref() != Some("dentist") {
            return Ok(None);
        }
        let Some(email) = user.email.as_deref() else {
            return Ok(None);
        };

        let path = format!("/rest/v1/dentists?email=eq.{}", email);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(result
            .first()
            .and_then(|row| row["id"].as_str())
            .and_then(|id| Uuid::parse_str(id).ok()))
    }

    async fn validate_slot(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        time: &str,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<NaiveTime, AppointmentError> {
        let slot = parse_time(time)
            .ok_or_else(|| AppointmentError::InvalidTime(time.to_string()))?;

        let now = Utc::now();
        if date < now.date_naive() || (date == now.date_naive() && slot <= now.time()) {
            return Err(AppointmentError::InvalidTime(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }

        let availability = self
            .schedules
            .check_availability(&dentist_id.to_string(), date, time)
            .await
            .map_err(|e| match e {
                ScheduleError::InvalidTime(t) => AppointmentError::InvalidTime(t),
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;
        if !availability.available {
            return Err(AppointmentError::SlotUnavailable(
                availability
                    .reason
                    .unwrap_or_else(|| "Dentist is not available at this time".to_string()),
            ));
        }

        self.ensure_slot_free(dentist_id, date, slot, exclude_appointment_id, auth_token)
            .await?;

        Ok(slot)
    }

    async fn ensure_slot_free(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        slot: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?dentist_id=eq.{}&date=eq.{}",
            dentist_id, date
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let existing: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        // The availability check has already pinned the slot inside a
        // same-day working window.
        let requested_end = slot
            .overflowing_add_signed(Duration::minutes(VISIT_LENGTH_MINUTES))
            .0;

        for appointment in existing {
            if Some(appointment.id) == exclude_appointment_id || !appointment.status.is_active() {
                continue;
            }
            let Some(taken) = parse_time(&appointment.time) else {
                continue;
            };
            let taken_end = taken
                .overflowing_add_signed(Duration::minutes(VISIT_LENGTH_MINUTES))
                .0;

            // Two visits overlap when each starts before the other ends.
            if slot < taken_end && taken < requested_end {
                warn!(
                    "Conflict detected for dentist {} on {} at {}",
                    dentist_id, date, appointment.time
                );
                return Err(AppointmentError::ConflictDetected);
            }
        }

        Ok(())
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let updated = result
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(updated)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    async fn fetch_patient_name(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<String, AppointmentError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::ValidationError("Patient profile not found".to_string()))?;

        let first = row["first_name"].as_str().unwrap_or_default();
        let last = row["last_name"].as_str().unwrap_or_default();
        let full = format!("{} {}", first, last).trim().to_string();
        if !full.is_empty() {
            return Ok(full);
        }

        Ok(row["username"].as_str().unwrap_or("Patient").to_string())
    }
}
