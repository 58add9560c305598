use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(postbox_messages_migration::Migrator).await;
}
