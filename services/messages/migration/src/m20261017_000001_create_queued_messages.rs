use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QueuedMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QueuedMessages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QueuedMessages::Recipient).string_len(64).not_null())
                    .col(ColumnDef::new(QueuedMessages::Sender).string_len(64).not_null())
                    .col(ColumnDef::new(QueuedMessages::Body).text().not_null())
                    .col(
                        ColumnDef::new(QueuedMessages::ScheduledTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QueuedMessages::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(QueuedMessages::Attempts)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(QueuedMessages::Attempts).gte(0)),
                    )
                    .col(
                        ColumnDef::new(QueuedMessages::Result)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(QueuedMessages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QueuedMessages::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QueuedMessages::ProcessedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QueuedMessages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QueuedMessages {
    Table,
    Id,
    Recipient,
    Sender,
    Body,
    ScheduledTime,
    Status,
    Attempts,
    Result,
    CreatedAt,
    UpdatedAt,
    ProcessedAt,
}
