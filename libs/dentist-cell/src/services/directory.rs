use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::validation::validate_email;

use crate::models::{
    CreateDentistRequest, Dentist, DentistError, DentistSearchFilters, UpdateDentistRequest,
};

pub struct DentistDirectoryService {
    supabase: SupabaseClient,
}

impl DentistDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Add a dentist to the directory. Email is unique across entries.
    pub async fn create_dentist(
        &self,
        request: CreateDentistRequest,
        auth_token: &str,
    ) -> Result<Dentist, DentistError> {
        debug!("Creating directory entry for: {}", request.email);

        if request.name.trim().is_empty() {
            return Err(DentistError::ValidationError("Name is required".to_string()));
        }
        if request.specialty.trim().is_empty() {
            return Err(DentistError::ValidationError("Specialty is required".to_string()));
        }
        if !validate_email(&request.email) {
            return Err(DentistError::ValidationError("Invalid email address".to_string()));
        }

        let existing_check_path = format!("/rest/v1/dentists?email=eq.{}", request.email);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_check_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| DentistError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(DentistError::DuplicateEmail);
        }

        let dentist_data = json!({
            "name": request.name,
            "specialty": request.specialty,
            "email": request.email,
            "phone": request.phone,
            "address": request.address,
            "city": request.city,
            "state": request.state,
            "zip_code": request.zip_code,
            "bio": request.bio,
            "education": request.education.unwrap_or_default(),
            "certifications": request.certifications.unwrap_or_default(),
            "services": request.services.unwrap_or_default(),
            "languages": request.languages.unwrap_or_default(),
            "insurance_accepted": request.insurance_accepted.unwrap_or_default(),
            "years_experience": request.years_experience,
            "rating": 0.0,
            "review_count": 0,
            "accepting_new_patients": request.accepting_new_patients.unwrap_or(true),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/dentists",
            Some(auth_token),
            Some(dentist_data),
            Some(headers),
        ).await.map_err(|e| DentistError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DentistError::DatabaseError("Failed to create dentist entry".to_string()));
        }

        let dentist: Dentist = serde_json::from_value(result[0].clone())
            .map_err(|e| DentistError::DatabaseError(e.to_string()))?;
        debug!("Directory entry created with id: {}", dentist.id);

        Ok(dentist)
    }

    /// Public lookup by id.
    pub async fn get_dentist(&self, dentist_id: &str) -> Result<Dentist, DentistError> {
        debug!("Fetching dentist: {}", dentist_id);

        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| DentistError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DentistError::NotFound);
        }

        let dentist: Dentist = serde_json::from_value(result[0].clone())
            .map_err(|e| DentistError::DatabaseError(e.to_string()))?;
        Ok(dentist)
    }

    /// Partial update of a directory entry.
    pub async fn update_dentist(
        &self,
        dentist_id: &str,
        request: UpdateDentistRequest,
        auth_token: &str,
    ) -> Result<Dentist, DentistError> {
        debug!("Updating dentist: {}", dentist_id);

        if let Some(ref email) = request.email {
            if !validate_email(email) {
                return Err(DentistError::ValidationError("Invalid email address".to_string()));
            }
        }

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(specialty) = request.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(city) = request.city {
            update_data.insert("city".to_string(), json!(city));
        }
        if let Some(state) = request.state {
            update_data.insert("state".to_string(), json!(state));
        }
        if let Some(zip_code) = request.zip_code {
            update_data.insert("zip_code".to_string(), json!(zip_code));
        }
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        if let Some(education) = request.education {
            update_data.insert("education".to_string(), json!(education));
        }
        if let Some(certifications) = request.certifications {
            update_data.insert("certifications".to_string(), json!(certifications));
        }
        if let Some(services) = request.services {
            update_data.insert("services".to_string(), json!(services));
        }
        if let Some(languages) = request.languages {
            update_data.insert("languages".to_string(), json!(languages));
        }
        if let Some(insurance) = request.insurance_accepted {
            update_data.insert("insurance_accepted".to_string(), json!(insurance));
        }
        if let Some(experience) = request.years_experience {
            update_data.insert("years_experience".to_string(), json!(experience));
        }
        if let Some(accepting) = request.accepting_new_patients {
            update_data.insert("accepting_new_patients".to_string(), json!(accepting));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| DentistError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DentistError::NotFound);
        }

        let updated: Dentist = serde_json::from_value(result[0].clone())
            .map_err(|e| DentistError::DatabaseError(e.to_string()))?;
        Ok(updated)
    }

    /// Public directory search. Filters combine as AND; results come back
    /// best-rated first.
    pub async fn search_dentists(
        &self,
        filters: DentistSearchFilters,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Dentist>, DentistError> {
        debug!("Searching dentists with filters: {:?}", filters);

        let mut query_parts: Vec<String> = Vec::new();

        if let Some(specialty) = filters.specialty {
            query_parts.push(format!(
                "specialty=ilike.{}",
                urlencoding::encode(&format!("%{}%", specialty))
            ));
        }
        if let Some(city) = filters.city {
            query_parts.push(format!(
                "city=ilike.{}",
                urlencoding::encode(&format!("%{}%", city))
            ));
        }
        if let Some(accepting) = filters.accepting_new_patients {
            query_parts.push(format!("accepting_new_patients=eq.{}", accepting));
        }
        if let Some(min_rating) = filters.min_rating {
            query_parts.push(format!("rating=gte.{}", min_rating));
        }

        let mut path = if query_parts.is_empty() {
            "/rest/v1/dentists?".to_string()
        } else {
            format!("/rest/v1/dentists?{}&", query_parts.join("&"))
        };

        path.push_str("order=rating.desc,review_count.desc");

        if let Some(limit_val) = limit {
            path.push_str(&format!("&limit={}", limit_val));
        }
        if let Some(offset_val) = offset {
            path.push_str(&format!("&offset={}", offset_val));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| DentistError::DatabaseError(e.to_string()))?;

        let dentists: Vec<Dentist> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Dentist>, _>>()
            .map_err(|e| DentistError::DatabaseError(e.to_string()))?;

        Ok(dentists)
    }
}
