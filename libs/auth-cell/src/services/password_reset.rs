use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AuthError, UserProfile};
use crate::services::mailer::MailService;
use crate::services::password::PasswordService;

const MIN_PASSWORD_LENGTH: usize = 6;

pub struct PasswordResetService {
    supabase: SupabaseClient,
    frontend_url: String,
    mailer: Option<MailService>,
}

impl PasswordResetService {
    pub fn new(config: &AppConfig) -> Self {
        // Without SMTP credentials the reset link is logged instead of mailed.
        let mailer = match MailService::new(config) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Mail transport unavailable: {}", e);
                None
            }
        };

        Self {
            supabase: SupabaseClient::new(config),
            frontend_url: config.frontend_url.clone(),
            mailer,
        }
    }

    /// Issue a reset token for the account and send the reset link.
    pub async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        debug!("Password reset requested for: {}", email);

        let email = email.trim().to_lowercase();

        let user = self.find_by_email(&email).await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_reset_token();

        let path = format!("/rest/v1/users?id=eq.{}", user.id);
        let update_data = json!({
            "password_reset_token": token,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let reset_link = format!("{}/reset-password?token={}", self.frontend_url, token);

        match &self.mailer {
            Some(mailer) => {
                mailer.send_password_reset_email(&user.email, &user.display_name(), &reset_link).await?;
                debug!("Reset email sent to: {}", user.email);
            }
            None => {
                info!("SMTP not configured; reset link for {}: {}", user.email, reset_link);
            }
        }

        Ok(())
    }

    /// Consume a reset token: set the new password and clear the token. An
    /// unknown or already-used token fails before anything is written.
    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        debug!("Password reset confirmation attempt");

        if token.trim().is_empty() {
            return Err(AuthError::InvalidResetToken);
        }
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let path = format!("/rest/v1/users?password_reset_token=eq.{}", token);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AuthError::InvalidResetToken);
        }

        let user: UserProfile = serde_json::from_value(result[0].clone())
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let password_hash = PasswordService::hash_password(new_password)
            .map_err(|e| AuthError::ValidationError(format!("Failed to hash password: {}", e)))?;

        let update_path = format!("/rest/v1/users?id=eq.{}", user.id);
        let update_data = json!({
            "password_hash": password_hash,
            "password_reset_token": null,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &update_path,
            None,
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        debug!("Password reset completed for user: {}", user.id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AuthError> {
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

/// Opaque single-use token stored on the user row until confirmed.
fn generate_reset_token() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_six_digits() {
        for _ in 0..50 {
            let token = generate_reset_token();
            assert_eq!(token.len(), 6);
            assert!(token.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
