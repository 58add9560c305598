use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use postbox_domain::id::MessageId;
use postbox_domain::status::MessageStatus;

use crate::domain::repository::{GatewayPort, MessageRepository};
use crate::domain::types::StatusChange;
use crate::error::MessagesServiceError;

/// Why a popped identifier produced no delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The broker payload is not a message id.
    InvalidId,
    /// No record with that id is ENQUEUED (unknown, or already handled).
    NotEnqueued,
    /// Another worker claimed the record first.
    LostRace,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidId => "invalid message id",
            Self::NotEnqueued => "message not enqueued",
            Self::LostRace => "claimed by another worker",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { id: MessageId, token: String },
    Failed { id: MessageId, reason: String },
    Discarded(DiscardReason),
}

/// Store calls made after a pop are retried this many times in total, since an
/// id dropped here is gone from the broker for good.
const STORE_ATTEMPTS: u32 = 3;
const STORE_RETRY_DELAY: Duration = Duration::from_millis(200);

// ── DeliverMessage ───────────────────────────────────────────────────────────

pub struct DeliverMessageUseCase<R: MessageRepository, G: GatewayPort> {
    pub repo: R,
    pub gateway: G,
}

impl<R: MessageRepository, G: GatewayPort> DeliverMessageUseCase<R, G> {
    /// Handle one identifier popped from the broker. Gateway failures become a
    /// FAILED record, never an `Err`; only store errors are returned.
    pub async fn execute(&self, raw_id: &str) -> Result<DeliveryOutcome, MessagesServiceError> {
        let Ok(id) = raw_id.parse::<MessageId>() else {
            warn!(raw_id, "discarding unparsable message id");
            return Ok(DeliveryOutcome::Discarded(DiscardReason::InvalidId));
        };

        let repo = &self.repo;
        let Some(message) = retry_store(id, "look up enqueued message", || {
            repo.find_by_id_with_status(id, MessageStatus::Enqueued)
        })
        .await?
        else {
            info!(message_id = %id, "message no longer enqueued, discarding");
            return Ok(DeliveryOutcome::Discarded(DiscardReason::NotEnqueued));
        };

        let claim = StatusChange::begin_attempt(Utc::now());
        if !retry_store(id, "claim message", || repo.compare_and_set(id, &claim)).await? {
            info!(message_id = %id, "message claimed by another worker, discarding");
            return Ok(DeliveryOutcome::Discarded(DiscardReason::LostRace));
        }

        let attempts = message.attempts + 1;
        match self
            .gateway
            .send(&message.recipient, &message.body, &message.sender)
            .await
        {
            Ok(token) => {
                let change = StatusChange::sent(token.clone(), Utc::now());
                let recorded =
                    retry_store(id, "record sent outcome", || repo.compare_and_set(id, &change))
                        .await?;
                if recorded {
                    info!(message_id = %id, attempts, token = %token, "message sent");
                } else {
                    warn!(
                        message_id = %id,
                        token = %token,
                        "message sent but record left PROCESSING before the outcome was stored"
                    );
                }
                Ok(DeliveryOutcome::Sent { id, token })
            }
            Err(gateway_err) => {
                let reason = gateway_err.to_string();
                let change = StatusChange::failed(reason.clone(), Utc::now());
                let recorded =
                    retry_store(id, "record failed outcome", || repo.compare_and_set(id, &change))
                        .await?;
                if recorded {
                    warn!(message_id = %id, attempts, error = %reason, "message delivery failed");
                } else {
                    warn!(
                        message_id = %id,
                        error = %reason,
                        "delivery failed and record left PROCESSING before the outcome was stored"
                    );
                }
                Ok(DeliveryOutcome::Failed { id, reason })
            }
        }
    }
}

/// Run a store call, retrying errors with a growing pause. A compare-and-set
/// that committed before its error cannot apply twice: the repeat reports a
/// lost race instead.
async fn retry_store<T, F, Fut>(
    id: MessageId,
    what: &'static str,
    mut op: F,
) -> Result<T, MessagesServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MessagesServiceError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if attempt < STORE_ATTEMPTS => {
                warn!(message_id = %id, attempt, error = %e.detail(), "{what} failed, retrying");
                tokio::time::sleep(STORE_RETRY_DELAY * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
