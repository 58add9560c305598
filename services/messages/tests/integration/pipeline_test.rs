use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;

use postbox_domain::pagination::{PageRequest, Sort};
use postbox_domain::status::MessageStatus;
use postbox_messages::daemon::scheduler::SchedulerLoop;
use postbox_messages::daemon::worker::WorkerLoop;
use postbox_messages::domain::types::MessageFilter;
use postbox_messages::usecase::deliver::DeliveryOutcome;
use postbox_messages::usecase::query::{GetMessageUseCase, ListMessagesUseCase};

use crate::helpers::{GatewayMode, InMemoryBroker, InMemoryRepo, StubGateway, test_message};

#[tokio::test]
async fn should_move_due_message_from_pending_to_sent() {
    let msg = test_message(Utc::now() - Duration::seconds(1));
    let repo = InMemoryRepo::with(vec![msg.clone()]);
    let broker = InMemoryBroker::default();
    let scheduler = SchedulerLoop::new(
        repo.clone(),
        broker.clone(),
        StdDuration::from_secs(30),
        None,
        CancellationToken::new(),
    );
    let worker = WorkerLoop::new(
        repo.clone(),
        broker.clone(),
        StubGateway::default(),
        StdDuration::from_millis(10),
        CancellationToken::new(),
    );

    let report = scheduler.run_cycle(Utc::now()).await.unwrap();
    assert_eq!(report.enqueued, 1);
    assert_eq!(repo.get(msg.id).status, MessageStatus::Enqueued);

    let outcome = worker.process_next().await.unwrap();
    assert!(matches!(outcome, Some(DeliveryOutcome::Sent { .. })));

    let stored = GetMessageUseCase { repo: repo.clone() }
        .execute(msg.id)
        .await
        .unwrap();
    assert_eq!(stored.status, MessageStatus::Sent);
    assert_eq!(stored.attempts, 1);
    assert!(stored.processed_at.is_some());
    assert!(broker.is_empty());
}

#[tokio::test]
async fn should_list_failed_messages_for_review() {
    let past = Utc::now() - Duration::seconds(1);
    let a = test_message(past - Duration::seconds(10));
    let b = test_message(past);
    let repo = InMemoryRepo::with(vec![a.clone(), b.clone()]);
    let broker = InMemoryBroker::default();
    let scheduler = SchedulerLoop::new(
        repo.clone(),
        broker.clone(),
        StdDuration::from_secs(30),
        None,
        CancellationToken::new(),
    );
    let worker = WorkerLoop::new(
        repo.clone(),
        broker,
        StubGateway::new(GatewayMode::NoCredentials),
        StdDuration::from_millis(10),
        CancellationToken::new(),
    );

    scheduler.run_cycle(Utc::now()).await.unwrap();
    worker.process_next().await.unwrap();
    worker.process_next().await.unwrap();

    let failed = ListMessagesUseCase { repo: repo.clone() }
        .execute(
            MessageFilter {
                status: Some(MessageStatus::Failed),
                search: Some("DENTIST".to_owned()),
                sort: Sort::Asc,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    let ids: Vec<_> = failed.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
    assert!(failed.iter().all(|m| m.processed_at.is_some() && m.attempts == 1));

    let first_page = ListMessagesUseCase { repo }
        .execute(
            MessageFilter::default(),
            PageRequest {
                per_page: 1,
                page: 1,
            },
        )
        .await
        .unwrap();
    // Default sort is newest scheduled first.
    assert_eq!(first_page.len(), 1);
    assert_eq!(first_page[0].id, b.id);
}
