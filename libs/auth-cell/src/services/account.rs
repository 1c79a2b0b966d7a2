use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::jwt::create_token;
use shared_utils::validation::{validate_email, validate_phone};

use crate::models::{
    AuthResponse, AuthError, LoginRequest, RegisterRequest, UpdateProfileRequest, UserProfile,
};
use crate::services::password::PasswordService;

const MIN_PASSWORD_LENGTH: usize = 6;

pub struct AccountService {
    supabase: SupabaseClient,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            jwt_secret: config.supabase_jwt_secret.clone(),
        }
    }

    /// Create an account and issue an access token. Email is the identity key;
    /// a duplicate registration is rejected before any row is written.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        debug!("Registering new account for: {}", request.email);

        let email = request.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AuthError::ValidationError("Email is required".to_string()));
        }
        if !validate_email(&email) {
            return Err(AuthError::ValidationError("Invalid email address".to_string()));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if let Some(phone) = request.phone.as_deref() {
            if !phone.trim().is_empty() && !validate_phone(phone) {
                return Err(AuthError::ValidationError("Invalid phone number".to_string()));
            }
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| AuthError::ValidationError(format!("Failed to hash password: {}", e)))?;

        // Default the username to the local part of the email address.
        let username = request.username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

        let is_dentist = request.is_dentist.unwrap_or(false);
        let role = if is_dentist { "dentist" } else { "patient" };

        let user_data = json!({
            "email": email,
            "username": username,
            "password_hash": password_hash,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "phone": request.phone,
            "address": request.address,
            "city": request.city,
            "state": request.state,
            "zip_code": request.zip_code,
            "is_patient": !is_dentist,
            "is_dentist": is_dentist,
            "role": role,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/users",
            None,
            Some(user_data),
            Some(headers),
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AuthError::DatabaseError("Failed to create user".to_string()));
        }

        let user: UserProfile = serde_json::from_value(result[0].clone())
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let token = create_token(&user.id.to_string(), &user.email, &user.role, &self.jwt_secret)
            .map_err(AuthError::TokenError)?;

        debug!("Account created for user: {}", user.id);
        Ok(AuthResponse { token, user })
    }

    /// Authenticate by email and password. An unknown email and a wrong
    /// password are distinct failures, reported as such.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        debug!("Login attempt for: {}", request.email);

        let email = request.email.trim().to_lowercase();

        let user = self.find_by_email(&email).await?
            .ok_or(AuthError::UserNotFound)?;

        let password_ok = PasswordService::verify_password(&request.password, &user.password_hash)
            .map_err(|e| AuthError::DatabaseError(format!("Password verification failed: {}", e)))?;

        if !password_ok {
            return Err(AuthError::InvalidCredentials);
        }

        let token = create_token(&user.id.to_string(), &user.email, &user.role, &self.jwt_secret)
            .map_err(AuthError::TokenError)?;

        debug!("Login successful for user: {}", user.id);
        Ok(AuthResponse { token, user })
    }

    pub async fn get_profile(&self, user_id: &str, auth_token: &str) -> Result<UserProfile, AuthError> {
        debug!("Fetching profile for user: {}", user_id);

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        let user: UserProfile = serde_json::from_value(result[0].clone())
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        Ok(user)
    }

    /// Partial update: only fields present in the request are written, the
    /// rest of the row is left untouched.
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<UserProfile, AuthError> {
        debug!("Updating profile for user: {}", user_id);

        if let Some(phone) = request.phone.as_deref() {
            if !phone.trim().is_empty() && !validate_phone(phone) {
                return Err(AuthError::ValidationError("Invalid phone number".to_string()));
            }
        }

        let mut update_data = serde_json::Map::new();

        if let Some(username) = request.username {
            update_data.insert("username".to_string(), json!(username));
        }
        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
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
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert("date_of_birth".to_string(), json!(date_of_birth));
        }
        if let Some(emergency_contact_name) = request.emergency_contact_name {
            update_data.insert("emergency_contact_name".to_string(), json!(emergency_contact_name));
        }
        if let Some(emergency_contact_phone) = request.emergency_contact_phone {
            update_data.insert("emergency_contact_phone".to_string(), json!(emergency_contact_phone));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        let updated: UserProfile = serde_json::from_value(result[0].clone())
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        Ok(updated)
    }

    pub(crate) async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AuthError> {
        let path = format!("/rest/v1/users?email=eq.{}", email);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let user: UserProfile = serde_json::from_value(row)
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
