use std::sync::atomic::Ordering;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;

use postbox_domain::status::MessageStatus;
use postbox_messages::daemon::scheduler::SchedulerLoop;
use postbox_messages::usecase::schedule::{CycleReport, EnqueueDueMessagesUseCase};

use crate::helpers::{InMemoryBroker, InMemoryRepo, message_in, test_message};

#[tokio::test]
async fn should_enqueue_due_message_and_push_id() {
    let msg = test_message(Utc::now() - Duration::seconds(1));
    let repo = InMemoryRepo::with(vec![msg.clone()]);
    let broker = InMemoryBroker::default();
    let uc = EnqueueDueMessagesUseCase {
        repo: repo.clone(),
        broker: broker.clone(),
    };

    let report = uc.execute(Utc::now()).await.unwrap();

    assert_eq!(
        report,
        CycleReport {
            due: 1,
            enqueued: 1,
            ..Default::default()
        }
    );
    assert_eq!(repo.get(msg.id).status, MessageStatus::Enqueued);
    assert_eq!(broker.ids(), vec![msg.id.to_string()]);
}

#[tokio::test]
async fn should_leave_future_messages_pending() {
    let future = test_message(Utc::now() + Duration::minutes(10));
    let repo = InMemoryRepo::with(vec![future.clone()]);
    let broker = InMemoryBroker::default();
    let uc = EnqueueDueMessagesUseCase {
        repo: repo.clone(),
        broker: broker.clone(),
    };

    let report = uc.execute(Utc::now()).await.unwrap();

    assert_eq!(report.due, 0);
    assert_eq!(repo.get(future.id).status, MessageStatus::Pending);
    assert!(broker.is_empty());
}

#[tokio::test]
async fn should_promote_in_ascending_scheduled_time() {
    let now = Utc::now();
    let late = test_message(now - Duration::seconds(5));
    let early = test_message(now - Duration::minutes(5));
    let middle = test_message(now - Duration::minutes(1));
    let repo = InMemoryRepo::with(vec![late.clone(), early.clone(), middle.clone()]);
    let broker = InMemoryBroker::default();
    let uc = EnqueueDueMessagesUseCase {
        repo,
        broker: broker.clone(),
    };

    uc.execute(now).await.unwrap();

    assert_eq!(
        broker.ids(),
        vec![
            early.id.to_string(),
            middle.id.to_string(),
            late.id.to_string()
        ]
    );
}

#[tokio::test]
async fn should_ignore_messages_past_pending() {
    let past = Utc::now() - Duration::minutes(1);
    let sent = message_in(MessageStatus::Sent, past);
    let enqueued = message_in(MessageStatus::Enqueued, past);
    let repo = InMemoryRepo::with(vec![sent.clone(), enqueued.clone()]);
    let broker = InMemoryBroker::default();
    let uc = EnqueueDueMessagesUseCase {
        repo: repo.clone(),
        broker: broker.clone(),
    };

    let report = uc.execute(Utc::now()).await.unwrap();

    assert_eq!(report.due, 0);
    assert!(broker.is_empty());
    assert_eq!(repo.get(sent.id).status, MessageStatus::Sent);
}

#[tokio::test]
async fn should_revert_to_pending_when_push_fails_and_retry_next_cycle() {
    let msg = test_message(Utc::now() - Duration::seconds(1));
    let repo = InMemoryRepo::with(vec![msg.clone()]);
    let broker = InMemoryBroker::default();
    broker.fail_push.store(true, Ordering::SeqCst);
    let uc = EnqueueDueMessagesUseCase {
        repo: repo.clone(),
        broker: broker.clone(),
    };

    let report = uc.execute(Utc::now()).await.unwrap();
    assert_eq!(report.reverted, 1);
    assert_eq!(report.enqueued, 0);
    assert_eq!(repo.get(msg.id).status, MessageStatus::Pending);
    assert!(broker.is_empty());

    broker.fail_push.store(false, Ordering::SeqCst);
    let report = uc.execute(Utc::now()).await.unwrap();
    assert_eq!(report.enqueued, 1);
    assert_eq!(repo.get(msg.id).status, MessageStatus::Enqueued);
    assert_eq!(broker.ids(), vec![msg.id.to_string()]);
}

#[tokio::test]
async fn should_enqueue_each_message_once_across_concurrent_schedulers() {
    let past = Utc::now() - Duration::minutes(1);
    let messages: Vec<_> = (0..6).map(|_| test_message(past)).collect();
    let repo = InMemoryRepo::with(messages.clone());
    let broker = InMemoryBroker::default();
    let a = EnqueueDueMessagesUseCase {
        repo: repo.clone(),
        broker: broker.clone(),
    };
    let b = EnqueueDueMessagesUseCase {
        repo: repo.clone(),
        broker: broker.clone(),
    };

    let now = Utc::now();
    let (ra, rb) = tokio::join!(a.execute(now), b.execute(now));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert_eq!(ra.enqueued + rb.enqueued, messages.len());
    let mut pushed = broker.ids();
    pushed.sort();
    pushed.dedup();
    assert_eq!(pushed.len(), messages.len());
    for msg in &messages {
        assert_eq!(repo.get(msg.id).status, MessageStatus::Enqueued);
    }
}

#[tokio::test]
async fn should_surface_failed_due_query() {
    let repo = InMemoryRepo::default();
    repo.fail_find_due.store(true, Ordering::SeqCst);
    let scheduler = SchedulerLoop::new(
        repo,
        InMemoryBroker::default(),
        StdDuration::from_millis(10),
        None,
        CancellationToken::new(),
    );

    let err = scheduler.run_cycle(Utc::now()).await.unwrap_err();
    assert_eq!(err.kind(), "INTERNAL");
}

#[tokio::test]
async fn should_keep_running_after_failed_cycle_until_cancelled() {
    let msg = test_message(Utc::now() - Duration::seconds(1));
    let repo = InMemoryRepo::with(vec![msg.clone()]);
    repo.fail_find_due.store(true, Ordering::SeqCst);
    let broker = InMemoryBroker::default();
    let shutdown = CancellationToken::new();
    let scheduler = SchedulerLoop::new(
        repo.clone(),
        broker.clone(),
        StdDuration::from_millis(10),
        None,
        shutdown.clone(),
    );

    let driver = async {
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        // Store recovers; the next cycle must pick the message up.
        repo.fail_find_due.store(false, Ordering::SeqCst);
        while broker.is_empty() {
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        shutdown.cancel();
    };
    tokio::time::timeout(StdDuration::from_secs(5), async {
        tokio::join!(scheduler.run(), driver)
    })
    .await
    .expect("scheduler stops after cancellation");

    assert_eq!(repo.get(msg.id).status, MessageStatus::Enqueued);
    assert_eq!(broker.ids(), vec![msg.id.to_string()]);
}
