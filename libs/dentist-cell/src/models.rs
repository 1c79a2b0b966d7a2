use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Directory entry for a practicing dentist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dentist {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub insurance_accepted: Vec<String>,
    pub years_experience: Option<i32>,
    pub rating: f32,
    pub review_count: i32,
    pub accepting_new_patients: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDentistRequest {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub bio: Option<String>,
    pub education: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub insurance_accepted: Option<Vec<String>>,
    pub years_experience: Option<i32>,
    pub accepting_new_patients: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDentistRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub bio: Option<String>,
    pub education: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub insurance_accepted: Option<Vec<String>>,
    pub years_experience: Option<i32>,
    pub accepting_new_patients: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DentistSearchFilters {
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub accepting_new_patients: Option<bool>,
    pub min_rating: Option<f32>,
}

// Error types specific to directory operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DentistError {
    NotFound,
    DuplicateEmail,
    ValidationError(String),
    DatabaseError(String),
}

impl std::fmt::Display for DentistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DentistError::NotFound => write!(f, "Dentist not found"),
            DentistError::DuplicateEmail => write!(f, "A dentist with this email already exists"),
            DentistError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            DentistError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DentistError {}
