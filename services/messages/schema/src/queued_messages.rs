use sea_orm::entity::prelude::*;

/// A message waiting for, undergoing, or finished with delivery.
/// `status` holds the lowercase state name (`pending` … `failed`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "queued_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recipient: String,
    pub sender: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub scheduled_time: chrono::DateTime<chrono::Utc>,
    pub status: String,
    pub attempts: i32,
    #[sea_orm(column_type = "Text")]
    pub result: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
