use axum::Json;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz`: readiness check.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub time: String,
}

/// Handler for `GET /status`: liveness plus the server's current time.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
