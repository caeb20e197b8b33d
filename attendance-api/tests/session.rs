use rocket::http::Status;
use rocket::local::asynchronous::Client;
use serde_json::{Value, json};
use std::time::Duration;

use attendance_api::config::AttendanceConfig;
use attendance_api::models::SessionView;
use attendance_api::orm::testing::{test_rocket, test_rocket_with};

async fn start(client: &Client, body: serde_json::Value) -> SessionView {
    let response = client.post("/api/1/Sessions").json(&body).dispatch().await;
    assert_eq!(response.status(), Status::Created);
    response.into_json().await.expect("valid session JSON")
}

#[rocket::async_test]
async fn test_start_session_issues_course_token() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let session = start(
        &client,
        json!({"courseCode": "CS101", "durationSeconds": 300, "rotationIntervalSeconds": 30}),
    )
    .await;

    assert_eq!(session.course_code, "CS101");
    assert_eq!(session.rotation_interval_seconds, 30);
    assert!(session.seconds_remaining > 290 && session.seconds_remaining <= 300);
    let token = session.token.expect("live session has a token");
    let millis = token
        .strip_prefix("CS101-")
        .expect("token starts with the course code");
    assert_eq!(millis.parse::<i64>().unwrap(), session.started_at.timestamp_millis());
    assert!(session.next_rotation.is_some());
}

#[rocket::async_test]
async fn test_defaults_come_from_config() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let session = start(&client, json!({"courseCode": "CS101"})).await;
    assert_eq!(session.rotation_interval_seconds, 10);
    assert_eq!((session.expires_at - session.started_at).num_seconds(), 60);
}

#[rocket::async_test]
async fn test_get_and_end_session() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");
    let session = start(&client, json!({"courseCode": "CS101"})).await;
    let url = format!("/api/1/Sessions/{}", session.id);

    let response = client.get(&url).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let current: SessionView = response.into_json().await.expect("valid session JSON");
    assert_eq!(current.id, session.id);
    assert!(current.token.unwrap().starts_with("CS101-"));

    let response = client.delete(&url).dispatch().await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client.get(&url).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let response = client.delete(&url).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_unknown_session_ids() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    let response = client.get("/api/1/Sessions/not-a-uuid").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .get("/api/1/Sessions/00000000-0000-0000-0000-000000000000")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_invalid_session_requests() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");

    for body in [
        json!({}),
        json!({"courseCode": "  "}),
        json!({"courseCode": "CS101", "durationSeconds": 0}),
        json!({"courseCode": "CS101", "rotationIntervalSeconds": 0}),
        json!({"courseCode": "CS101", "durationSeconds": 1_000_000}),
    ] {
        let response = client.post("/api/1/Sessions").json(&body).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest, "body {}", body);
    }
}

#[rocket::async_test]
async fn test_expired_session_is_gone() {
    let client = Client::tracked(test_rocket())
        .await
        .expect("valid rocket instance");
    let session = start(&client, json!({"courseCode": "CS101", "durationSeconds": 1})).await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = client
        .get(format!("/api/1/Sessions/{}", session.id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Gone);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["error"], "Session has expired");
}

#[rocket::async_test]
async fn test_expired_session_token_is_rejected_when_enforced() {
    let config = AttendanceConfig {
        enforce_active_sessions: true,
        ..AttendanceConfig::default()
    };
    let client = Client::tracked(test_rocket_with(config))
        .await
        .expect("valid rocket instance");
    let session = start(&client, json!({"courseCode": "CS101", "durationSeconds": 1})).await;
    let token = session.token.expect("live session has a token");

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = client
        .post("/api/1/Attendance")
        .json(&json!({"studentId": "s1", "courseCode": "CS101", "sessionCode": token}))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["error"], "Session code is not active");
}
