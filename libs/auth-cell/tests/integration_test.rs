use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use auth_cell::services::PasswordService;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_body(boundary: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn register_endpoint_returns_201_with_token_and_profile() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let user_id = Uuid::new_v4().to_string();
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::user_row(&user_id, "fresh@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/register",
        json!({"email": "fresh@example.com", "password": "hunter22"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: Value = serde_json::from_slice(&body).unwrap();

    assert!(json_response["token"].is_string());
    assert_eq!(json_response["user"]["email"], "fresh@example.com");
    // Credential columns never leave the service.
    assert!(json_response["user"].get("password_hash").is_none());
    assert!(json_response["user"].get("password_reset_token").is_none());
}

#[tokio::test]
async fn login_endpoint_unknown_email_returns_404() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/login",
        json!({"email": "ghost@example.com", "password": "whatever1"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_endpoint_wrong_password_returns_401() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    let user_id = Uuid::new_v4().to_string();
    let mut row = MockSupabaseResponses::user_row(&user_id, "patient@example.com");
    row["password_hash"] = json!(PasswordService::hash_password("right-pw").unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/login",
        json!({"email": "patient@example.com", "password": "wrong-pw"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_endpoint_requires_a_token() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_request_stores_a_six_digit_token() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    let user_id = Uuid::new_v4().to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.patient@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(&user_id, "patient@example.com")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(&user_id, "patient@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/password-reset",
        json!({"email": "patient@example.com"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|r| r.method.to_string() == "PATCH")
        .expect("no PATCH request recorded");
    let body: Value = serde_json::from_slice(&patch.body).unwrap();

    let token = body["password_reset_token"].as_str().unwrap();
    assert_eq!(token.len(), 6);
    assert!(token.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn password_reset_request_unknown_email_returns_404() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/password-reset",
        json!({"email": "ghost@example.com"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn password_reset_confirm_rewrites_hash_and_clears_token() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    let user_id = Uuid::new_v4().to_string();
    let mut row = MockSupabaseResponses::user_row(&user_id, "patient@example.com");
    row["password_reset_token"] = json!("123456");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("password_reset_token", "eq.123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(&user_id, "patient@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/password-reset/confirm",
        json!({"token": "123456", "password": "brand-new-pw"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|r| r.method.to_string() == "PATCH")
        .expect("no PATCH request recorded");
    let body: Value = serde_json::from_slice(&patch.body).unwrap();

    assert!(body["password_hash"].as_str().unwrap().starts_with("$argon2"));
    assert!(body["password_reset_token"].is_null());
}

#[tokio::test]
async fn stale_reset_token_is_rejected_without_writes() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = json_request(
        "POST",
        "/password-reset/confirm",
        json!({"token": "999999", "password": "brand-new-pw"}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.to_string() != "PATCH"));
}

#[tokio::test]
async fn upload_rejects_oversized_file() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let boundary = "----upload-test-boundary";
    let payload = vec![0u8; 3 * 1024 * 1024];
    let body = multipart_body(boundary, "photo.png", "image/png", &payload);

    let request = Request::builder()
        .method("POST")
        .uri("/upload-profile-picture")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_unsupported_image_type() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let boundary = "----upload-test-boundary";
    let body = multipart_body(boundary, "animation.gif", "image/gif", &[0u8; 512]);

    let request = Request::builder()
        .method("POST")
        .uri("/upload-profile-picture")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_stores_image_and_returns_its_public_url() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/profiles/avatars/.+\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(&user.id, &user.email)
        ])))
        .mount(&mock_server)
        .await;

    let boundary = "----upload-test-boundary";
    let body = multipart_body(boundary, "portrait.png", "image/png", &[137u8; 1024]);

    let request = Request::builder()
        .method("POST")
        .uri("/upload-profile-picture")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: Value = serde_json::from_slice(&body).unwrap();

    let image_url = json_response["imageUrl"].as_str().unwrap();
    let expected_prefix = format!(
        "{}/storage/v1/object/public/profiles/avatars/{}/",
        mock_server.uri(),
        user.id
    );
    assert!(image_url.starts_with(&expected_prefix));
    assert!(image_url.ends_with(".png"));
}
