use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::repository::{GatewayPort, MessageBroker, MessageRepository};
use crate::error::MessagesServiceError;
use crate::usecase::deliver::{DeliverMessageUseCase, DeliveryOutcome};

/// Pause after a failed broker pop before trying again.
pub const POP_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Counters accumulated over one `WorkerLoop::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub sent: u64,
    pub failed: u64,
    pub discarded: u64,
    /// Store errors while handling a popped id.
    pub errors: u64,
    pub pop_errors: u64,
}

impl WorkerStats {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Sent { .. } => self.sent += 1,
            DeliveryOutcome::Failed { .. } => self.failed += 1,
            DeliveryOutcome::Discarded(_) => self.discarded += 1,
        }
    }
}

/// Pops identifiers from the broker and delivers them one at a time.
pub struct WorkerLoop<R: MessageRepository, B: MessageBroker, G: GatewayPort> {
    deliver: DeliverMessageUseCase<R, G>,
    broker: B,
    pop_timeout: Duration,
    error_backoff: Duration,
    shutdown: CancellationToken,
}

impl<R, B, G> WorkerLoop<R, B, G>
where
    R: MessageRepository,
    B: MessageBroker,
    G: GatewayPort,
{
    pub fn new(
        repo: R,
        broker: B,
        gateway: G,
        pop_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            deliver: DeliverMessageUseCase { repo, gateway },
            broker,
            pop_timeout,
            error_backoff: POP_ERROR_BACKOFF,
            shutdown,
        }
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Pop once and handle the id, if any. `Ok(None)` means the pop timed out.
    pub async fn process_next(&self) -> Result<Option<DeliveryOutcome>, MessagesServiceError> {
        let Some(raw_id) = self.broker.pop(self.pop_timeout).await? else {
            return Ok(None);
        };
        self.deliver.execute(&raw_id).await.map(Some)
    }

    /// Run until the shutdown token is cancelled. Cancellation is only observed
    /// between pops, so an id taken from the broker is always handled.
    pub async fn run(&self) -> WorkerStats {
        info!(pop_timeout_secs = self.pop_timeout.as_secs(), "worker started");
        let mut stats = WorkerStats::default();
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            let raw_id = match self.broker.pop(self.pop_timeout).await {
                Ok(Some(raw_id)) => raw_id,
                Ok(None) => continue,
                Err(e) => {
                    stats.pop_errors += 1;
                    error!(error = %e.detail(), "broker pop failed, backing off");
                    tokio::select! {
                        () = tokio::time::sleep(self.error_backoff) => {}
                        () = self.shutdown.cancelled() => break,
                    }
                    continue;
                }
            };
            match self.deliver.execute(&raw_id).await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    stats.errors += 1;
                    error!(raw_id = %raw_id, error = %e.detail(), "failed to handle message");
                }
            }
        }
        info!(
            sent = stats.sent,
            failed = stats.failed,
            discarded = stats.discarded,
            errors = stats.errors,
            "worker stopped"
        );
        stats
    }
}
