use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::AuthError;

const MAX_FILE_SIZE: usize = 2 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const STORAGE_BUCKET: &str = "profiles";

pub struct ProfilePictureService {
    supabase: SupabaseClient,
}

impl ProfilePictureService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Store an uploaded image and point the user's profile at its public URL.
    pub async fn upload_profile_picture(
        &self,
        user_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        auth_token: &str,
    ) -> Result<String, AuthError> {
        debug!("Profile picture upload for user: {}", user_id);

        if bytes.is_empty() {
            return Err(AuthError::ValidationError("Uploaded file is empty".to_string()));
        }

        if bytes.len() > MAX_FILE_SIZE {
            return Err(AuthError::ValidationError(
                "Profile picture must be 2MB or smaller".to_string(),
            ));
        }

        let extension = filename
            .rsplit('.')
            .next()
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AuthError::ValidationError(
                "Unsupported image type, expected jpg, jpeg or png".to_string(),
            ));
        }

        let content_type = match extension.as_str() {
            "png" => "image/png",
            _ => "image/jpeg",
        };

        let storage_path = format!(
            "{}/avatars/{}/{}.{}",
            STORAGE_BUCKET,
            user_id,
            Uuid::new_v4(),
            extension
        );

        self.supabase
            .upload_file(&storage_path, bytes, content_type, auth_token)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let public_url = self.supabase.get_public_url(&storage_path);

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let update_data = json!({
            "profile_picture_url": public_url,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        debug!("Profile picture stored at: {}", storage_path);
        Ok(public_url)
    }
}
