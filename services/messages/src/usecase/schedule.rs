use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::domain::repository::{MessageBroker, MessageRepository};
use crate::domain::types::StatusChange;
use crate::error::MessagesServiceError;

/// Per-cycle counters, logged by the scheduler loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Due PENDING records seen at the start of the cycle.
    pub due: usize,
    /// Promoted to ENQUEUED and pushed onto the broker.
    pub enqueued: usize,
    /// Promoted, push failed, put back to PENDING.
    pub reverted: usize,
    /// Taken by another scheduler instance or hit a store error.
    pub skipped: usize,
    /// Stale PROCESSING records moved to FAILED before promotion.
    pub stale_failed: usize,
}

// ── EnqueueDueMessages ───────────────────────────────────────────────────────

pub struct EnqueueDueMessagesUseCase<R: MessageRepository, B: MessageBroker> {
    pub repo: R,
    pub broker: B,
}

impl<R: MessageRepository, B: MessageBroker> EnqueueDueMessagesUseCase<R, B> {
    /// Promote every due PENDING message, earliest first. Only a failed due
    /// query aborts the cycle; per-message failures are logged and counted.
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<CycleReport, MessagesServiceError> {
        let due = self.repo.find_due(now).await?;
        let mut report = CycleReport {
            due: due.len(),
            ..Default::default()
        };

        for message in due {
            let id = message.id;
            match self
                .repo
                .compare_and_set(id, &StatusChange::enqueue(Utc::now()))
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    debug!(message_id = %id, "already promoted elsewhere, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(message_id = %id, error = %e.detail(), "failed to promote message");
                    report.skipped += 1;
                    continue;
                }
            }

            match self.broker.push(id).await {
                Ok(()) => {
                    debug!(message_id = %id, "message enqueued");
                    report.enqueued += 1;
                }
                Err(push_err) => {
                    warn!(
                        message_id = %id,
                        error = %push_err.detail(),
                        "broker push failed, reverting to pending"
                    );
                    report.reverted += 1;
                    match self
                        .repo
                        .compare_and_set(id, &StatusChange::revert_enqueue(Utc::now()))
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => {
                            error!(message_id = %id, "message left ENQUEUED state before revert");
                        }
                        Err(e) => {
                            error!(
                                message_id = %id,
                                error = %e.detail(),
                                "failed to revert message to pending"
                            );
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}
