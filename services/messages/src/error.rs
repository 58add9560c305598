use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Messages service error variants.
#[derive(Debug, thiserror::Error)]
pub enum MessagesServiceError {
    #[error("message not found")]
    MessageNotFound,
    #[error("invalid message id")]
    InvalidMessageId,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is longer than {1} characters")]
    FieldTooLong(&'static str, usize),
    #[error("scheduled_time must be an RFC 3339 timestamp (e.g. 2026-10-17T09:30:00Z)")]
    InvalidScheduledTime,
    #[error("scheduled_time must be in the future")]
    ScheduledTimeInPast,
    #[error("no sender given and no default sender configured")]
    SenderNotConfigured,
    #[error("unknown status filter")]
    InvalidStatusFilter,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl MessagesServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MessageNotFound => "MESSAGE_NOT_FOUND",
            Self::InvalidMessageId => "INVALID_MESSAGE_ID",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::FieldTooLong(..) => "FIELD_TOO_LONG",
            Self::InvalidScheduledTime => "INVALID_SCHEDULED_TIME",
            Self::ScheduledTimeInPast => "SCHEDULED_TIME_IN_PAST",
            Self::SenderNotConfigured => "SENDER_NOT_CONFIGURED",
            Self::InvalidStatusFilter => "INVALID_STATUS_FILTER",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Log-friendly text; includes the full context chain for internal errors.
    pub fn detail(&self) -> String {
        match self {
            Self::Internal(e) => format!("{e:#}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for MessagesServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MessageNotFound => StatusCode::NOT_FOUND,
            Self::InvalidMessageId
            | Self::MissingField(_)
            | Self::FieldTooLong(..)
            | Self::InvalidScheduledTime
            | Self::ScheduledTimeInPast
            | Self::SenderNotConfigured
            | Self::InvalidStatusFilter => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected client errors and already visible in the TraceLayer span.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Failure reported by the outbound messaging gateway. The `Display` text is
/// what gets persisted in a FAILED record's `result`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Twilio credentials not configured (TWILIO_ACCOUNT_SID/TWILIO_AUTH_TOKEN)")]
    CredentialsNotConfigured,
    #[error("sender address is required")]
    MissingSender,
    #[error("gateway request failed: {0}")]
    Transport(String),
    #[error("gateway rejected message ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}
