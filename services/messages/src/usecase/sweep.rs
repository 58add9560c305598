use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::repository::MessageRepository;
use crate::domain::types::StatusChange;
use crate::error::MessagesServiceError;

// ── FailStaleProcessing ──────────────────────────────────────────────────────

/// Moves PROCESSING records with no recorded outcome after `stale_after` to
/// FAILED. Never re-delivers.
pub struct FailStaleProcessingUseCase<R: MessageRepository> {
    pub repo: R,
    pub stale_after: Duration,
}

impl<R: MessageRepository> FailStaleProcessingUseCase<R> {
    pub fn failure_reason(&self) -> String {
        format!(
            "delivery interrupted: no outcome recorded within {}s",
            self.stale_after.as_secs()
        )
    }

    /// Returns how many records were moved to FAILED.
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<usize, MessagesServiceError> {
        let cutoff = now
            - chrono::Duration::from_std(self.stale_after).context("stale cutoff out of range")?;
        let stale = self.repo.find_stale_processing(cutoff).await?;
        let reason = self.failure_reason();

        let mut failed = 0;
        for message in stale {
            let change = StatusChange::failed(reason.clone(), Utc::now());
            match self.repo.compare_and_set(message.id, &change).await {
                Ok(true) => {
                    warn!(
                        message_id = %message.id,
                        attempts = message.attempts,
                        "stale processing message marked failed"
                    );
                    failed += 1;
                }
                // The worker recorded an outcome in the meantime.
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        message_id = %message.id,
                        error = %e.detail(),
                        "failed to mark stale message"
                    );
                }
            }
        }
        Ok(failed)
    }
}
