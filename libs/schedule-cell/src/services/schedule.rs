use chrono::{Datelike, Duration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::time::parse_time;

use crate::models::{
    AvailabilityCheck, DentistSchedule, ScheduleError, WeeklyHours, VISIT_LENGTH_MINUTES,
};

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Fetch a dentist's schedule. A dentist with no stored row gets the
    /// default weekday hours.
    pub async fn get_schedule(&self, dentist_id: &str) -> Result<DentistSchedule, ScheduleError> {
        debug!("Fetching schedule for dentist: {}", dentist_id);

        let path = format!("/rest/v1/schedules?dentist_id=eq.{}", dentist_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map_err(|e| ScheduleError::DatabaseError(e.to_string())),
            None => {
                let dentist_id = Uuid::parse_str(dentist_id)
                    .map_err(|_| ScheduleError::ValidationError("Invalid dentist id".to_string()))?;
                Ok(DentistSchedule {
                    id: Uuid::new_v4(),
                    dentist_id,
                    working_hours: WeeklyHours::default(),
                    days_off: Vec::new(),
                    updated_at: Utc::now(),
                })
            }
        }
    }

    /// Replace the weekly hours. The day set is validated before writing.
    pub async fn update_working_hours(
        &self,
        dentist_id: &str,
        working_hours: WeeklyHours,
        auth_token: &str,
    ) -> Result<DentistSchedule, ScheduleError> {
        debug!("Updating working hours for dentist: {}", dentist_id);

        validate_weekly_hours(&working_hours)?;

        let current = self.get_schedule(dentist_id).await?;
        self.write_schedule(dentist_id, &working_hours, &current.days_off, auth_token)
            .await
    }

    /// Mark a date as off. Adding a date that is already off is a no-op.
    pub async fn add_day_off(
        &self,
        dentist_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<DentistSchedule, ScheduleError> {
        debug!("Adding day off {} for dentist: {}", date, dentist_id);

        let current = self.get_schedule(dentist_id).await?;

        let mut days_off = current.days_off;
        if !days_off.contains(&date) {
            days_off.push(date);
            days_off.sort();
        }

        self.write_schedule(dentist_id, &current.working_hours, &days_off, auth_token)
            .await
    }

    /// Clear a day off. Removing a date that is not off is a no-op.
    pub async fn remove_day_off(
        &self,
        dentist_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<DentistSchedule, ScheduleError> {
        debug!("Removing day off {} for dentist: {}", date, dentist_id);

        let current = self.get_schedule(dentist_id).await?;

        let mut days_off = current.days_off;
        days_off.retain(|d| d != &date);

        self.write_schedule(dentist_id, &current.working_hours, &days_off, auth_token)
            .await
    }

    /// Can a visit start at `time` on `date`? The full visit must fit inside
    /// the working window, the date must not be a day off.
    pub async fn check_availability(
        &self,
        dentist_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<AvailabilityCheck, ScheduleError> {
        let probe = parse_time(time)
            .ok_or_else(|| ScheduleError::InvalidTime(time.to_string()))?;

        let schedule = self.get_schedule(dentist_id).await?;

        if schedule.days_off.contains(&date) {
            return Ok(AvailabilityCheck::closed("Dentist is off on this date"));
        }

        let day = schedule.working_hours.for_weekday(date.weekday());
        if !day.is_working {
            return Ok(AvailabilityCheck::closed("Not a working day"));
        }

        let (Some(start), Some(end)) = (parse_time(&day.start_time), parse_time(&day.end_time))
        else {
            return Err(ScheduleError::ValidationError(
                "Stored working hours are malformed".to_string(),
            ));
        };

        let (visit_end, wrapped) =
            probe.overflowing_add_signed(Duration::minutes(VISIT_LENGTH_MINUTES));
        if wrapped != 0 || probe < start || visit_end > end {
            return Ok(AvailabilityCheck::closed("Outside working hours"));
        }

        Ok(AvailabilityCheck::open())
    }

    // Update the stored row, inserting it on first write.
    async fn write_schedule(
        &self,
        dentist_id: &str,
        working_hours: &WeeklyHours,
        days_off: &[NaiveDate],
        auth_token: &str,
    ) -> Result<DentistSchedule, ScheduleError> {
        let update_data = json!({
            "working_hours": working_hours,
            "days_off": days_off,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let path = format!("/rest/v1/schedules?dentist_id=eq.{}", dentist_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers.clone()),
        ).await.map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        if let Some(row) = result.into_iter().next() {
            return serde_json::from_value(row)
                .map_err(|e| ScheduleError::DatabaseError(e.to_string()));
        }

        let insert_data = json!({
            "dentist_id": dentist_id,
            "working_hours": working_hours,
            "days_off": days_off,
            "updated_at": Utc::now().to_rfc3339()
        });

        let inserted: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/schedules",
            Some(auth_token),
            Some(insert_data),
            Some(headers),
        ).await.map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        match inserted.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map_err(|e| ScheduleError::DatabaseError(e.to_string())),
            None => Err(ScheduleError::DatabaseError(
                "Failed to store schedule".to_string(),
            )),
        }
    }
}

fn validate_weekly_hours(hours: &WeeklyHours) -> Result<(), ScheduleError> {
    for (name, day) in hours.days() {
        if !day.is_working {
            continue;
        }

        let start = parse_time(&day.start_time)
            .ok_or_else(|| ScheduleError::InvalidTime(format!("{} start_time", name)))?;
        let end = parse_time(&day.end_time)
            .ok_or_else(|| ScheduleError::InvalidTime(format!("{} end_time", name)))?;

        if start >= end {
            return Err(ScheduleError::ValidationError(format!(
                "{}: start_time must be before end_time",
                name
            )));
        }
    }

    Ok(())
}
