use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::Authorization;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use schedule_cell::handlers::{
    add_day_off, check_availability, get_schedule, update_schedule, AvailabilityQuery,
};
use schedule_cell::models::{DayOffRequest, DaySchedule, UpdateScheduleRequest, WeeklyHours};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn mock_known_dentist(mock_server: &MockServer, dentist_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::dentist_row(dentist_id)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn get_schedule_returns_defaults_when_none_stored() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_schedule(State(config), Path(dentist_id.clone())).await;

    assert!(result.is_ok());
    let body = result.unwrap().0;
    assert_eq!(body["dentist_id"], dentist_id);
    assert_eq!(body["working_hours"]["monday"]["is_working"], true);
    assert_eq!(body["working_hours"]["monday"]["start_time"], "09:00");
    assert_eq!(body["working_hours"]["saturday"]["is_working"], false);
    assert_eq!(body["days_off"], json!([]));
}

#[tokio::test]
async fn get_schedule_unknown_dentist_is_404() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_schedule(State(config), Path(Uuid::new_v4().to_string())).await;

    assert!(result.is_err());
    match result.unwrap_err() {
        AppError::NotFound(_) => {}
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn availability_false_on_day_off() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;

    let mut row = MockSupabaseResponses::schedule_row(&dentist_id);
    row["days_off"] = json!(["2025-06-02"]);
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let query = AvailabilityQuery {
        date: date("2025-06-02"),
        time: "10:00".to_string(),
    };
    let result = check_availability(State(config), Path(dentist_id), Query(query)).await;

    assert!(result.is_ok());
    let body = result.unwrap().0;
    assert_eq!(body["available"], false);
    assert_eq!(body["reason"], "Dentist is off on this date");
}

#[tokio::test]
async fn availability_false_on_non_working_day() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_row(&dentist_id)
        ])))
        .mount(&mock_server)
        .await;

    // 2025-06-01 is a Sunday.
    let query = AvailabilityQuery {
        date: date("2025-06-01"),
        time: "10:00".to_string(),
    };
    let result = check_availability(State(config), Path(dentist_id), Query(query)).await;

    assert!(result.is_ok());
    let body = result.unwrap().0;
    assert_eq!(body["available"], false);
    assert_eq!(body["reason"], "Not a working day");
}

#[tokio::test]
async fn availability_false_when_visit_would_overrun_closing() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_row(&dentist_id)
        ])))
        .mount(&mock_server)
        .await;

    // 16:45 start runs to 17:15, past the 17:00 close.
    let query = AvailabilityQuery {
        date: date("2025-06-02"),
        time: "16:45".to_string(),
    };
    let result = check_availability(State(config), Path(dentist_id), Query(query)).await;

    assert!(result.is_ok());
    let body = result.unwrap().0;
    assert_eq!(body["available"], false);
    assert_eq!(body["reason"], "Outside working hours");
}

#[tokio::test]
async fn availability_true_inside_working_window() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::schedule_row(&dentist_id)
        ])))
        .mount(&mock_server)
        .await;

    let query = AvailabilityQuery {
        date: date("2025-06-02"),
        time: "10:00".to_string(),
    };
    let result = check_availability(State(config), Path(dentist_id), Query(query)).await;

    assert!(result.is_ok());
    let body = result.unwrap().0;
    assert_eq!(body["available"], true);
    assert!(body["reason"].is_null());
}

#[tokio::test]
async fn availability_rejects_malformed_time() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;

    let query = AvailabilityQuery {
        date: date("2025-06-02"),
        time: "25:99".to_string(),
    };
    let result = check_availability(State(config), Path(dentist_id), Query(query)).await;

    assert!(result.is_err());
    match result.unwrap_err() {
        AppError::BadRequest(msg) => assert!(msg.contains("Invalid time")),
        other => panic!("Expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn update_requires_dentist_or_admin_role() {
    let config = TestConfig::default().to_arc();

    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.supabase_jwt_secret, Some(24));

    let request = UpdateScheduleRequest {
        working_hours: WeeklyHours::default(),
    };

    let result = update_schedule(
        State(config),
        Path(Uuid::new_v4().to_string()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(patient.to_user()),
        Json(request),
    )
    .await;

    assert!(result.is_err());
    match result.unwrap_err() {
        AppError::Auth(_) => {}
        other => panic!("Expected Auth, got {:?}", other),
    }
}

#[tokio::test]
async fn update_rejects_inverted_hours() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;

    let dentist = TestUser::dentist("dds@example.com");
    let token = JwtTestUtils::create_test_token(&dentist, &config.supabase_jwt_secret, Some(24));

    let mut hours = WeeklyHours::default();
    hours.monday = DaySchedule {
        is_working: true,
        start_time: "17:00".to_string(),
        end_time: "09:00".to_string(),
    };

    let result = update_schedule(
        State(config),
        Path(dentist_id),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(dentist.to_user()),
        Json(UpdateScheduleRequest {
            working_hours: hours,
        }),
    )
    .await;

    assert!(result.is_err());
    match result.unwrap_err() {
        AppError::BadRequest(_) => {}
        other => panic!("Expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn adding_an_existing_day_off_does_not_duplicate_it() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;

    let mut stored = MockSupabaseResponses::schedule_row(&dentist_id);
    stored["days_off"] = json!(["2025-07-04"]);
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored.clone()])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(&mock_server)
        .await;

    let dentist = TestUser::dentist("dds@example.com");
    let token = JwtTestUtils::create_test_token(&dentist, &config.supabase_jwt_secret, Some(24));

    let result = add_day_off(
        State(config),
        Path(dentist_id),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(dentist.to_user()),
        Json(DayOffRequest {
            date: date("2025-07-04"),
        }),
    )
    .await;

    assert!(result.is_ok());

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|r| r.method.to_string() == "PATCH")
        .expect("no PATCH request recorded");
    let sent: Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(sent["days_off"], json!(["2025-07-04"]));
}

#[tokio::test]
async fn first_write_inserts_a_schedule_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let dentist_id = Uuid::new_v4().to_string();
    mock_known_dentist(&mock_server, &dentist_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    // Nothing stored yet, so the PATCH matches no rows and the write falls
    // through to an insert.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::schedule_row(&dentist_id)
        ])))
        .mount(&mock_server)
        .await;

    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(24));

    let result = update_schedule(
        State(config),
        Path(dentist_id.clone()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(admin.to_user()),
        Json(UpdateScheduleRequest {
            working_hours: WeeklyHours::default(),
        }),
    )
    .await;

    assert!(result.is_ok());

    let requests = mock_server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.to_string() == "POST")
        .expect("no POST request recorded");
    let sent: Value = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(sent["dentist_id"], dentist_id);
    assert_eq!(sent["working_hours"]["friday"]["end_time"], "17:00");
}
