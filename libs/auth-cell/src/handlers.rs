use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AuthError, AuthResponse, LoginRequest, PasswordResetConfirmRequest, PasswordResetRequest,
    RegisterRequest, UpdateProfileRequest, UserProfile,
};
use crate::services::{AccountService, PasswordResetService, ProfilePictureService};

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    debug!("Registration attempt for: {}", request.email);

    let service = AccountService::new(&config);
    let response = service.register(request).await.map_err(|e| match e {
        AuthError::EmailAlreadyRegistered => {
            AppError::BadRequest("Email is already registered".to_string())
        }
        AuthError::ValidationError(msg) => AppError::BadRequest(msg),
        AuthError::TokenError(msg) => AppError::Internal(msg),
        other => AppError::Database(other.to_string()),
    })?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    debug!("Login attempt for: {}", request.email);

    let service = AccountService::new(&config);
    let response = service.login(request).await.map_err(|e| match e {
        AuthError::UserNotFound => {
            AppError::NotFound("No account found for this email".to_string())
        }
        AuthError::InvalidCredentials => AppError::Auth("Invalid email or password".to_string()),
        AuthError::ValidationError(msg) => AppError::BadRequest(msg),
        AuthError::TokenError(msg) => AppError::Internal(msg),
        other => AppError::Database(other.to_string()),
    })?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn get_me(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<UserProfile>, AppError> {
    let service = AccountService::new(&config);
    let profile = service
        .get_profile(&user.id, auth.token())
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    debug!("Profile update for user: {}", user.id);

    let service = AccountService::new(&config);
    let profile = service
        .update_profile(&user.id, request, auth.token())
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn request_password_reset(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PasswordResetService::new(&config);
    service.request_reset(&request.email).await.map_err(|e| match e {
        AuthError::UserNotFound => {
            AppError::NotFound("No account found for this email".to_string())
        }
        AuthError::ValidationError(msg) => AppError::BadRequest(msg),
        AuthError::MailError(msg) => AppError::ExternalService(msg),
        other => AppError::Database(other.to_string()),
    })?;

    Ok(Json(json!({
        "message": "Password reset instructions sent"
    })))
}

#[axum::debug_handler]
pub async fn confirm_password_reset(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PasswordResetService::new(&config);
    service
        .confirm_reset(&request.token, &request.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidResetToken => {
                AppError::BadRequest("Invalid or expired reset token".to_string())
            }
            AuthError::ValidationError(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        })?;

    Ok(Json(json!({
        "message": "Password updated"
    })))
}

#[axum::debug_handler]
pub async fn upload_profile_picture(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // First field carrying a filename is the image, anything else is skipped.
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read uploaded file: {}", e)))?;

        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No image file in request".to_string()))?;

    let service = ProfilePictureService::new(&config);
    let image_url = service
        .upload_profile_picture(&user.id, &filename, bytes, auth.token())
        .await
        .map_err(|e| match e {
            AuthError::ValidationError(msg) => AppError::BadRequest(msg),
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            other => AppError::Database(other.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "imageUrl": image_url }))))
}
