use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func, LikeExpr},
};

use postbox_domain::id::MessageId;
use postbox_domain::pagination::{PageRequest, Sort};
use postbox_domain::status::MessageStatus;
use postbox_messages_schema::queued_messages;

use crate::domain::repository::MessageRepository;
use crate::domain::types::{MessageFilter, QueuedMessage, StatusChange};
use crate::error::MessagesServiceError;

// ── Message repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMessageRepository {
    pub db: DatabaseConnection,
}

impl MessageRepository for DbMessageRepository {
    async fn create(&self, message: &QueuedMessage) -> Result<(), MessagesServiceError> {
        queued_messages::ActiveModel {
            id: Set(message.id.0),
            recipient: Set(message.recipient.clone()),
            sender: Set(message.sender.clone()),
            body: Set(message.body.clone()),
            scheduled_time: Set(message.scheduled_time),
            status: Set(message.status.as_str().to_owned()),
            attempts: Set(i32::try_from(message.attempts).context("attempts out of range")?),
            result: Set(message.result.clone()),
            created_at: Set(message.created_at),
            updated_at: Set(message.updated_at),
            processed_at: Set(message.processed_at),
        }
        .insert(&self.db)
        .await
        .context("create queued message")?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: MessageId,
    ) -> Result<Option<QueuedMessage>, MessagesServiceError> {
        let model = queued_messages::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find queued message by id")?;
        model.map(message_from_model).transpose()
    }

    async fn find_by_id_with_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<Option<QueuedMessage>, MessagesServiceError> {
        let model = queued_messages::Entity::find_by_id(id.0)
            .filter(queued_messages::Column::Status.eq(status.as_str()))
            .one(&self.db)
            .await
            .context("find queued message by id and status")?;
        model.map(message_from_model).transpose()
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueuedMessage>, MessagesServiceError> {
        let models = queued_messages::Entity::find()
            .filter(queued_messages::Column::Status.eq(MessageStatus::Pending.as_str()))
            .filter(queued_messages::Column::ScheduledTime.lte(now))
            .order_by_asc(queued_messages::Column::ScheduledTime)
            .order_by_asc(queued_messages::Column::CreatedAt)
            .order_by_asc(queued_messages::Column::Id)
            .all(&self.db)
            .await
            .context("find due messages")?;
        models.into_iter().map(message_from_model).collect()
    }

    async fn find_stale_processing(
        &self,
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<QueuedMessage>, MessagesServiceError> {
        let models = queued_messages::Entity::find()
            .filter(queued_messages::Column::Status.eq(MessageStatus::Processing.as_str()))
            .filter(queued_messages::Column::UpdatedAt.lt(updated_before))
            .order_by_asc(queued_messages::Column::UpdatedAt)
            .all(&self.db)
            .await
            .context("find stale processing messages")?;
        models.into_iter().map(message_from_model).collect()
    }

    async fn list(
        &self,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<Vec<QueuedMessage>, MessagesServiceError> {
        let mut query = queued_messages::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(queued_messages::Column::Status.eq(status.as_str()));
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            let mut any = Condition::any();
            for column in [
                queued_messages::Column::Recipient,
                queued_messages::Column::Sender,
                queued_messages::Column::Body,
            ] {
                any = any.add(
                    Expr::expr(Func::lower(Expr::col(column)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                );
            }
            query = query.filter(any);
        }
        query = match filter.sort {
            Sort::Desc => query
                .order_by_desc(queued_messages::Column::ScheduledTime)
                .order_by_desc(queued_messages::Column::Id),
            Sort::Asc => query
                .order_by_asc(queued_messages::Column::ScheduledTime)
                .order_by_asc(queued_messages::Column::Id),
        };
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list queued messages")?;
        models.into_iter().map(message_from_model).collect()
    }

    async fn compare_and_set(
        &self,
        id: MessageId,
        change: &StatusChange,
    ) -> Result<bool, MessagesServiceError> {
        use queued_messages::Column;

        let mut update = queued_messages::Entity::update_many()
            .col_expr(Column::Status, Expr::value(change.to().as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(change.at()));
        if change.increments_attempts() {
            update = update.col_expr(Column::Attempts, Expr::col(Column::Attempts).add(1));
        }
        if let Some(result) = change.result() {
            update = update.col_expr(Column::Result, Expr::value(result.to_owned()));
        }
        if let Some(processed_at) = change.processed_at() {
            update = update.col_expr(Column::ProcessedAt, Expr::value(processed_at));
        }
        let result = update
            .filter(Column::Id.eq(id.0))
            .filter(Column::Status.eq(change.from().as_str()))
            .exec(&self.db)
            .await
            .with_context(|| format!("update message status {} -> {}", change.from(), change.to()))?;
        Ok(result.rows_affected == 1)
    }
}

fn message_from_model(
    model: queued_messages::Model,
) -> Result<QueuedMessage, MessagesServiceError> {
    let status = model
        .status
        .parse::<MessageStatus>()
        .with_context(|| format!("stored status of message {}", model.id))?;
    let attempts = u32::try_from(model.attempts)
        .with_context(|| format!("stored attempts of message {}", model.id))?;
    Ok(QueuedMessage {
        id: MessageId(model.id),
        recipient: model.recipient,
        sender: model.sender,
        body: model.body,
        scheduled_time: model.scheduled_time,
        status,
        attempts,
        result: model.result,
        created_at: model.created_at,
        updated_at: model.updated_at,
        processed_at: model.processed_at,
    })
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
