use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::repository::{MessageBroker, MessageRepository};
use crate::error::MessagesServiceError;
use crate::usecase::schedule::{CycleReport, EnqueueDueMessagesUseCase};
use crate::usecase::sweep::FailStaleProcessingUseCase;

/// Periodically promotes due messages onto the broker until cancelled.
pub struct SchedulerLoop<R: MessageRepository, B: MessageBroker> {
    enqueue: EnqueueDueMessagesUseCase<R, B>,
    sweep: Option<FailStaleProcessingUseCase<R>>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<R, B> SchedulerLoop<R, B>
where
    R: MessageRepository + Clone,
    B: MessageBroker,
{
    pub fn new(
        repo: R,
        broker: B,
        interval: Duration,
        stale_after: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sweep: stale_after.map(|stale_after| FailStaleProcessingUseCase {
                repo: repo.clone(),
                stale_after,
            }),
            enqueue: EnqueueDueMessagesUseCase { repo, broker },
            interval,
            shutdown,
        }
    }

    /// One pass: optional stale sweep, then promotion of due messages.
    /// `Err` means the due query failed and nothing was promoted.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, MessagesServiceError> {
        let mut stale_failed = 0;
        if let Some(sweep) = &self.sweep {
            match sweep.execute(now).await {
                Ok(n) => stale_failed = n,
                Err(e) => error!(error = %e.detail(), "stale processing sweep failed"),
            }
        }
        let report = self.enqueue.execute(now).await?;
        Ok(CycleReport {
            stale_failed,
            ..report
        })
    }

    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            stale_sweep = self.sweep.is_some(),
            "scheduler started"
        );
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            match self.run_cycle(Utc::now()).await {
                Ok(report) if report.due > 0 || report.stale_failed > 0 => info!(
                    due = report.due,
                    enqueued = report.enqueued,
                    reverted = report.reverted,
                    skipped = report.skipped,
                    stale_failed = report.stale_failed,
                    "scheduler cycle complete"
                ),
                Ok(_) => debug!("scheduler cycle complete, nothing due"),
                Err(e) => error!(error = %e.detail(), "scheduler cycle failed, skipping"),
            }
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.shutdown.cancelled() => break,
            }
        }
        info!("scheduler stopped");
    }
}
