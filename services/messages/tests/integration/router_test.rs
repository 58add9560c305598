use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use postbox_messages::router::build_router;
use postbox_messages::state::AppState;

/// Router over a store that is never reached: only paths that answer before
/// touching the database are exercised here.
fn server(default_sender: Option<&str>) -> TestServer {
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        default_sender: default_sender.map(str::to_owned),
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_report_status_with_server_time() {
    let resp = server(None).get("/status").await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
    let time = body["time"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
}

#[tokio::test]
async fn should_answer_health_probes_with_request_id() {
    let server = server(None);

    let resp = server.get("/healthz").await;
    resp.assert_status_ok();
    assert!(!resp.header("x-request-id").is_empty());

    server.get("/readyz").await.assert_status_ok();
}

#[tokio::test]
async fn should_reject_creation_with_missing_recipient() {
    let resp = server(Some("+14155238886"))
        .post("/messages")
        .json(&json!({
            "body": "hello",
            "scheduled_time": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "MISSING_FIELD");
    assert_eq!(body["message"], "missing required field `recipient`");
}

#[tokio::test]
async fn should_reject_creation_in_the_past() {
    let resp = server(Some("+14155238886"))
        .post("/messages")
        .json(&json!({
            "recipient": "+15550001111",
            "body": "hello",
            "scheduled_time": "2020-01-01T00:00:00Z",
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "SCHEDULED_TIME_IN_PAST");
}

#[tokio::test]
async fn should_reject_creation_without_any_sender() {
    let resp = server(None)
        .post("/messages")
        .json(&json!({
            "recipient": "+15550001111",
            "body": "hello",
            "scheduled_time": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "SENDER_NOT_CONFIGURED");
}

#[tokio::test]
async fn should_reject_malformed_message_id() {
    let resp = server(None).get("/messages/not-a-uuid").await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "INVALID_MESSAGE_ID");
}

#[tokio::test]
async fn should_reject_unknown_status_filter() {
    let resp = server(None).get("/messages?status=archived").await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "INVALID_STATUS_FILTER");
}
