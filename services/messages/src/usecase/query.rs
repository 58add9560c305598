use postbox_domain::id::MessageId;
use postbox_domain::pagination::PageRequest;

use crate::domain::repository::MessageRepository;
use crate::domain::types::{MessageFilter, QueuedMessage};
use crate::error::MessagesServiceError;

// ── GetMessage ───────────────────────────────────────────────────────────────

pub struct GetMessageUseCase<R: MessageRepository> {
    pub repo: R,
}

impl<R: MessageRepository> GetMessageUseCase<R> {
    pub async fn execute(&self, id: MessageId) -> Result<QueuedMessage, MessagesServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(MessagesServiceError::MessageNotFound)
    }
}

// ── ListMessages ─────────────────────────────────────────────────────────────

pub struct ListMessagesUseCase<R: MessageRepository> {
    pub repo: R,
}

impl<R: MessageRepository> ListMessagesUseCase<R> {
    pub async fn execute(
        &self,
        filter: MessageFilter,
        page: PageRequest,
    ) -> Result<Vec<QueuedMessage>, MessagesServiceError> {
        self.repo.list(&filter, page.clamped()).await
    }
}
