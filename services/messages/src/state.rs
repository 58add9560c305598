use sea_orm::DatabaseConnection;

use crate::infra::db::DbMessageRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// Used when a creation request carries no sender.
    pub default_sender: Option<String>,
}

impl AppState {
    pub fn message_repo(&self) -> DbMessageRepository {
        DbMessageRepository {
            db: self.db.clone(),
        }
    }
}
