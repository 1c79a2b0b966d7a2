use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc, Weekday};

/// Fixed visit length. Every appointment occupies one slot of this size.
pub const VISIT_LENGTH_MINUTES: i64 = 30;

/// One weekday's opening hours. Times travel as `HH:MM` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub is_working: bool,
    pub start_time: String,
    pub end_time: String,
}

impl DaySchedule {
    fn working(start: &str, end: &str) -> Self {
        Self {
            is_working: true,
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    fn closed(start: &str, end: &str) -> Self {
        Self {
            is_working: false,
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WeeklyHours {
    pub fn for_weekday(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn days(&self) -> [(&'static str, &DaySchedule); 7] {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
    }
}

impl Default for WeeklyHours {
    /// Weekday practice hours, closed on weekends.
    fn default() -> Self {
        Self {
            monday: DaySchedule::working("09:00", "17:00"),
            tuesday: DaySchedule::working("09:00", "17:00"),
            wednesday: DaySchedule::working("09:00", "17:00"),
            thursday: DaySchedule::working("09:00", "17:00"),
            friday: DaySchedule::working("09:00", "17:00"),
            saturday: DaySchedule::closed("09:00", "13:00"),
            sunday: DaySchedule::closed("09:00", "13:00"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DentistSchedule {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub working_hours: WeeklyHours,
    pub days_off: Vec<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub working_hours: WeeklyHours,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOffRequest {
    pub date: NaiveDate,
}

/// Outcome of an availability probe for one date and start time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub reason: Option<String>,
}

impl AvailabilityCheck {
    pub fn open() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    pub fn closed(reason: &str) -> Self {
        Self {
            available: false,
            reason: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
