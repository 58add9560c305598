use chrono::{Duration, SecondsFormat, Utc};

use postbox_domain::status::MessageStatus;
use postbox_messages::error::MessagesServiceError;
use postbox_messages::usecase::create_message::{CreateMessageInput, CreateMessageUseCase};

use crate::helpers::{InMemoryRepo, RECIPIENT, SENDER};

fn in_an_hour() -> String {
    (Utc::now() + Duration::hours(1)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn input(sender: Option<&str>, scheduled_time: Option<String>) -> CreateMessageInput {
    CreateMessageInput {
        recipient: Some(RECIPIENT.to_owned()),
        sender: sender.map(str::to_owned),
        body: Some("Your table is ready".to_owned()),
        scheduled_time,
    }
}

#[tokio::test]
async fn should_store_new_message_as_pending() {
    let repo = InMemoryRepo::default();
    let uc = CreateMessageUseCase {
        repo: repo.clone(),
        default_sender: None,
    };

    let created = uc
        .execute(input(Some(SENDER), Some(in_an_hour())))
        .await
        .unwrap();

    let stored = repo.get(created.id);
    assert_eq!(stored.status, MessageStatus::Pending);
    assert_eq!(stored.sender, SENDER);
    assert_eq!(stored.attempts, 0);
    assert!(stored.result.is_empty());
    assert!(stored.processed_at.is_none());
    assert!(stored.scheduled_time > Utc::now());
}

#[tokio::test]
async fn should_fall_back_to_default_sender() {
    let repo = InMemoryRepo::default();
    let uc = CreateMessageUseCase {
        repo: repo.clone(),
        default_sender: Some("+14155238886".to_owned()),
    };

    let created = uc.execute(input(Some("  "), Some(in_an_hour()))).await.unwrap();
    assert_eq!(repo.get(created.id).sender, "+14155238886");
}

#[tokio::test]
async fn should_reject_when_no_sender_available() {
    let repo = InMemoryRepo::default();
    let uc = CreateMessageUseCase {
        repo: repo.clone(),
        default_sender: None,
    };

    let result = uc.execute(input(None, Some(in_an_hour()))).await;
    assert!(
        matches!(result, Err(MessagesServiceError::SenderNotConfigured)),
        "expected SenderNotConfigured, got {result:?}"
    );
    assert!(repo.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_scheduled_time_not_in_future() {
    let uc = CreateMessageUseCase {
        repo: InMemoryRepo::default(),
        default_sender: None,
    };
    let past = (Utc::now() - Duration::minutes(1)).to_rfc3339();

    let result = uc.execute(input(Some(SENDER), Some(past))).await;
    assert!(matches!(
        result,
        Err(MessagesServiceError::ScheduledTimeInPast)
    ));
}

#[tokio::test]
async fn should_reject_missing_and_malformed_fields() {
    let uc = CreateMessageUseCase {
        repo: InMemoryRepo::default(),
        default_sender: Some(SENDER.to_owned()),
    };

    let result = uc
        .execute(CreateMessageInput {
            recipient: None,
            ..input(None, Some(in_an_hour()))
        })
        .await;
    assert!(matches!(
        result,
        Err(MessagesServiceError::MissingField("recipient"))
    ));

    let result = uc
        .execute(CreateMessageInput {
            body: Some("\n".to_owned()),
            ..input(None, Some(in_an_hour()))
        })
        .await;
    assert!(matches!(
        result,
        Err(MessagesServiceError::MissingField("body"))
    ));

    let result = uc
        .execute(input(None, Some("next tuesday".to_owned())))
        .await;
    assert!(matches!(
        result,
        Err(MessagesServiceError::InvalidScheduledTime)
    ));
}

#[tokio::test]
async fn should_reject_overlong_recipient() {
    let uc = CreateMessageUseCase {
        repo: InMemoryRepo::default(),
        default_sender: Some(SENDER.to_owned()),
    };

    let result = uc
        .execute(CreateMessageInput {
            recipient: Some("9".repeat(65)),
            ..input(None, Some(in_an_hour()))
        })
        .await;
    assert!(matches!(
        result,
        Err(MessagesServiceError::FieldTooLong("recipient", 64))
    ));
}
