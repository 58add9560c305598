use chrono::{DateTime, Utc};

use crate::domain::repository::MessageRepository;
use crate::domain::types::QueuedMessage;
use crate::error::MessagesServiceError;

/// Recipient and sender column width.
pub const MAX_ADDRESS_LEN: usize = 64;

// ── CreateMessage ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CreateMessageInput {
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub body: Option<String>,
    /// RFC 3339 timestamp; offsets are normalized to UTC.
    pub scheduled_time: Option<String>,
}

pub struct CreateMessageUseCase<R: MessageRepository> {
    pub repo: R,
    pub default_sender: Option<String>,
}

impl<R: MessageRepository> CreateMessageUseCase<R> {
    pub async fn execute(
        &self,
        input: CreateMessageInput,
    ) -> Result<QueuedMessage, MessagesServiceError> {
        let now = Utc::now();
        let recipient = required(input.recipient, "recipient")?;
        let body = input
            .body
            .filter(|b| !b.trim().is_empty())
            .ok_or(MessagesServiceError::MissingField("body"))?;
        let scheduled_time = parse_scheduled_time(input.scheduled_time)?;
        if scheduled_time <= now {
            return Err(MessagesServiceError::ScheduledTimeInPast);
        }
        let sender = input
            .sender
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.default_sender
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
            })
            .ok_or(MessagesServiceError::SenderNotConfigured)?;

        check_len(&recipient, "recipient")?;
        check_len(&sender, "sender")?;

        let message = QueuedMessage::pending(recipient, sender, body, scheduled_time, now);
        self.repo.create(&message).await?;
        tracing::info!(
            message_id = %message.id,
            scheduled_time = %message.scheduled_time,
            "message scheduled"
        );
        Ok(message)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, MessagesServiceError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(MessagesServiceError::MissingField(field))
}

fn check_len(value: &str, field: &'static str) -> Result<(), MessagesServiceError> {
    if value.chars().count() > MAX_ADDRESS_LEN {
        return Err(MessagesServiceError::FieldTooLong(field, MAX_ADDRESS_LEN));
    }
    Ok(())
}

fn parse_scheduled_time(raw: Option<String>) -> Result<DateTime<Utc>, MessagesServiceError> {
    let raw = required(raw, "scheduled_time")?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| MessagesServiceError::InvalidScheduledTime)
}
