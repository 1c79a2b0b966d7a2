use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A patient-authored review of a dentist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub rating: i32,
    pub comment: String,
    pub date: NaiveDate,
    pub procedure: Option<String>,
    pub dentist_response: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub dentist_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub procedure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondToReviewRequest {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVisibilityRequest {
    pub is_visible: bool,
}

/// Live aggregate over a dentist's visible reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

// Error types specific to review operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReviewError {
    NotFound,
    DentistNotFound,
    NoAppointmentHistory,
    DuplicateReview,
    NotReviewSubject,
    ValidationError(String),
    DatabaseError(String),
}

impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewError::NotFound => write!(f, "Review not found"),
            ReviewError::DentistNotFound => write!(f, "Dentist not found"),
            ReviewError::NoAppointmentHistory => {
                write!(f, "No appointment history with this dentist")
            }
            ReviewError::DuplicateReview => {
                write!(f, "This patient has already reviewed this dentist")
            }
            ReviewError::NotReviewSubject => {
                write!(f, "Only the reviewed dentist can respond")
            }
            ReviewError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ReviewError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ReviewError {}
