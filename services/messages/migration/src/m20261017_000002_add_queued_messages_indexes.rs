use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Scheduler poll: status = 'pending' AND scheduled_time <= now ORDER BY scheduled_time.
        manager
            .create_index(
                Index::create()
                    .table(QueuedMessages::Table)
                    .col(QueuedMessages::Status)
                    .col(QueuedMessages::ScheduledTime)
                    .name("idx_queued_messages_status_scheduled_time")
                    .to_owned(),
            )
            .await?;
        // Stale-processing sweep: status = 'processing' AND updated_at < cutoff.
        manager
            .create_index(
                Index::create()
                    .table(QueuedMessages::Table)
                    .col(QueuedMessages::Status)
                    .col(QueuedMessages::UpdatedAt)
                    .name("idx_queued_messages_status_updated_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_queued_messages_status_updated_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_queued_messages_status_scheduled_time")
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum QueuedMessages {
    Table,
    Status,
    ScheduledTime,
    UpdatedAt,
}
