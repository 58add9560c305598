use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use postbox_domain::id::MessageId;
use postbox_domain::pagination::{PageRequest, Sort};
use postbox_domain::status::MessageStatus;

use crate::domain::types::{MessageFilter, QueuedMessage};
use crate::error::MessagesServiceError;
use crate::state::AppState;
use crate::usecase::create_message::{CreateMessageInput, CreateMessageUseCase};
use crate::usecase::query::{GetMessageUseCase, ListMessagesUseCase};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CreatedMessageResponse {
    pub id: MessageId,
    #[serde(serialize_with = "postbox_core::serde::to_rfc3339_ms")]
    pub scheduled_time: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: MessageId,
    pub recipient: String,
    pub sender: String,
    pub body: String,
    #[serde(serialize_with = "postbox_core::serde::to_rfc3339_ms")]
    pub scheduled_time: chrono::DateTime<chrono::Utc>,
    pub status: MessageStatus,
    pub attempts: u32,
    pub result: String,
    #[serde(serialize_with = "postbox_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "postbox_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "postbox_core::serde::to_rfc3339_ms_opt")]
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<QueuedMessage> for MessageResponse {
    fn from(m: QueuedMessage) -> Self {
        Self {
            id: m.id,
            recipient: m.recipient,
            sender: m.sender,
            body: m.body,
            scheduled_time: m.scheduled_time,
            status: m.status,
            attempts: m.attempts,
            result: m.result,
            created_at: m.created_at,
            updated_at: m.updated_at,
            processed_at: m.processed_at,
        }
    }
}

// ── POST /messages ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub body: Option<String>,
    pub scheduled_time: Option<String>,
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<CreatedMessageResponse>), MessagesServiceError> {
    let usecase = CreateMessageUseCase {
        repo: state.message_repo(),
        default_sender: state.default_sender.clone(),
    };
    let message = usecase
        .execute(CreateMessageInput {
            recipient: req.recipient,
            sender: req.sender,
            body: req.body,
            scheduled_time: req.scheduled_time,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedMessageResponse {
            id: message.id,
            scheduled_time: message.scheduled_time,
        }),
    ))
}

// ── GET /messages ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct MessageListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub sort: Option<Sort>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl MessageListQuery {
    fn into_filter_and_page(self) -> Result<(MessageFilter, PageRequest), MessagesServiceError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<MessageStatus>()
                    .map_err(|_| MessagesServiceError::InvalidStatusFilter)?,
            ),
        };
        let search = self
            .q
            .map(|q| q.trim().to_owned())
            .filter(|q| !q.is_empty());
        let filter = MessageFilter {
            status,
            search,
            sort: self.sort.unwrap_or_default(),
        };
        let page = PageRequest {
            per_page: self.per_page.unwrap_or(25),
            page: self.page.unwrap_or(1),
        };
        Ok((filter, page))
    }
}

pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<Vec<MessageResponse>>, MessagesServiceError> {
    let (filter, page) = query.into_filter_and_page()?;
    let usecase = ListMessagesUseCase {
        repo: state.message_repo(),
    };
    let messages = usecase.execute(filter, page).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

// ── GET /messages/{id} ───────────────────────────────────────────────────────

pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, MessagesServiceError> {
    let id = id
        .parse::<MessageId>()
        .map_err(|_| MessagesServiceError::InvalidMessageId)?;
    let usecase = GetMessageUseCase {
        repo: state.message_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}
