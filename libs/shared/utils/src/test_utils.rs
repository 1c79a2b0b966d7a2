use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test config pointed at a mock server instead of the default localhost.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            frontend_url: "http://localhost:5173".to_string(),
            smtp_host: String::new(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: "no-reply@dentalcare.example".to_string(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn dentist(email: &str) -> Self {
        Self::new(email, "dentist")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(user_id: &str, email: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "email": email,
            "username": "testuser",
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$0sBpSRr1HX7fZZ5dTVrOvYzVJbbNmSET1PU3kGVRGVY",
            "first_name": "Test",
            "last_name": "User",
            "phone": "415-555-2671",
            "address": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "zip_code": "62701",
            "date_of_birth": null,
            "emergency_contact_name": null,
            "emergency_contact_phone": null,
            "is_patient": true,
            "is_dentist": false,
            "role": "patient",
            "profile_picture_url": null,
            "password_reset_token": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn dentist_row(dentist_id: &str) -> serde_json::Value {
        json!({
            "id": dentist_id,
            "name": "Dr. Sarah Chen",
            "specialty": "Orthodontics",
            "email": "s.chen@dentalcare.example",
            "phone": "415-555-0100",
            "address": "200 Clinic Way",
            "city": "Springfield",
            "state": "IL",
            "zip_code": "62701",
            "bio": "Board-certified orthodontist",
            "education": ["DDS, University of Illinois"],
            "certifications": ["Invisalign Certified"],
            "services": ["Braces", "Invisalign", "Retainers"],
            "languages": ["English", "Mandarin"],
            "insurance_accepted": ["Delta Dental", "Cigna"],
            "years_experience": 12,
            "rating": 4.8,
            "review_count": 24,
            "accepting_new_patients": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(appointment_id: &str, dentist_id: &str, patient_id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "dentist_id": dentist_id,
            "patient_id": patient_id,
            "patient_name": "Test User",
            "dentist_name": "Dr. Sarah Chen",
            "date": "2025-10-15",
            "time": "10:00",
            "status": status,
            "reason": "Routine cleaning",
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn review_row(review_id: &str, dentist_id: &str, patient_id: &str, rating: i32) -> serde_json::Value {
        json!({
            "id": review_id,
            "dentist_id": dentist_id,
            "patient_id": patient_id,
            "patient_name": "Test User",
            "rating": rating,
            "comment": "Great experience",
            "date": "2025-01-10",
            "procedure": "Cleaning",
            "dentist_response": null,
            "is_visible": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn schedule_row(dentist_id: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "dentist_id": dentist_id,
            "working_hours": {
                "monday": {"is_working": true, "start_time": "09:00", "end_time": "17:00"},
                "tuesday": {"is_working": true, "start_time": "09:00", "end_time": "17:00"},
                "wednesday": {"is_working": true, "start_time": "09:00", "end_time": "17:00"},
                "thursday": {"is_working": true, "start_time": "09:00", "end_time": "17:00"},
                "friday": {"is_working": true, "start_time": "09:00", "end_time": "17:00"},
                "saturday": {"is_working": false, "start_time": "09:00", "end_time": "13:00"},
                "sunday": {"is_working": false, "start_time": "09:00", "end_time": "13:00"}
            },
            "days_off": [],
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}
