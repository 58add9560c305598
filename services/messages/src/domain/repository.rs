#![allow(async_fn_in_trait)]

use std::time::Duration;

use chrono::{DateTime, Utc};

use postbox_domain::id::MessageId;
use postbox_domain::pagination::PageRequest;
use postbox_domain::status::MessageStatus;

use crate::domain::types::{MessageFilter, QueuedMessage, StatusChange};
use crate::error::{GatewayError, MessagesServiceError};

/// Durable record store for queued messages.
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &QueuedMessage) -> Result<(), MessagesServiceError>;

    async fn find_by_id(&self, id: MessageId)
    -> Result<Option<QueuedMessage>, MessagesServiceError>;

    /// Point lookup that only matches while the record is in `status`.
    async fn find_by_id_with_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<Option<QueuedMessage>, MessagesServiceError>;

    /// PENDING messages with `scheduled_time <= now`, earliest due first.
    async fn find_due(&self, now: DateTime<Utc>)
    -> Result<Vec<QueuedMessage>, MessagesServiceError>;

    /// PROCESSING messages whose last transition happened before `updated_before`.
    async fn find_stale_processing(
        &self,
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<QueuedMessage>, MessagesServiceError>;

    async fn list(
        &self,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<Vec<QueuedMessage>, MessagesServiceError>;

    /// Atomically apply `change` to one record if it is still in `change.from()`.
    /// Returns `true` only for the single caller whose update took effect.
    async fn compare_and_set(
        &self,
        id: MessageId,
        change: &StatusChange,
    ) -> Result<bool, MessagesServiceError>;
}

/// Ordered hand-off queue carrying message ids from scheduler to worker.
pub trait MessageBroker: Send + Sync {
    /// Append an id at the tail of the queue.
    async fn push(&self, id: MessageId) -> Result<(), MessagesServiceError>;

    /// Take the id at the head of the queue, waiting up to `timeout`.
    /// `None` means the wait elapsed with nothing to do.
    async fn pop(&self, timeout: Duration) -> Result<Option<String>, MessagesServiceError>;
}

/// Outbound messaging gateway. Returns an opaque delivery token.
pub trait GatewayPort: Send + Sync {
    async fn send(&self, recipient: &str, body: &str, sender: &str)
    -> Result<String, GatewayError>;
}
