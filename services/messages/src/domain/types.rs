use chrono::{DateTime, Utc};

use postbox_domain::id::MessageId;
use postbox_domain::pagination::Sort;
use postbox_domain::status::MessageStatus;

/// A message scheduled for delivery through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub id: MessageId,
    pub recipient: String,
    pub sender: String,
    pub body: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: MessageStatus,
    pub attempts: u32,
    /// Gateway token on success, failure description on failure, empty before.
    pub result: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set iff `status` is terminal.
    pub processed_at: Option<DateTime<Utc>>,
}

impl QueuedMessage {
    /// A freshly created, not yet promoted message.
    pub fn pending(
        recipient: String,
        sender: String,
        body: String,
        scheduled_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            recipient,
            sender,
            body,
            scheduled_time,
            status: MessageStatus::Pending,
            attempts: 0,
            result: String::new(),
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time <= now
    }
}

/// A single-record compare-and-set: applied only while the record is still in
/// `from`. Constructors exist for the legal pipeline edges only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    from: MessageStatus,
    to: MessageStatus,
    increment_attempts: bool,
    result: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
}

impl StatusChange {
    fn edge(from: MessageStatus, to: MessageStatus, at: DateTime<Utc>) -> Self {
        debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
        Self {
            from,
            to,
            increment_attempts: false,
            result: None,
            processed_at: None,
            at,
        }
    }

    /// PENDING → ENQUEUED (scheduler promotion).
    pub fn enqueue(at: DateTime<Utc>) -> Self {
        Self::edge(MessageStatus::Pending, MessageStatus::Enqueued, at)
    }

    /// ENQUEUED → PENDING (broker push failed after promotion).
    pub fn revert_enqueue(at: DateTime<Utc>) -> Self {
        Self::edge(MessageStatus::Enqueued, MessageStatus::Pending, at)
    }

    /// ENQUEUED → PROCESSING, counting one more delivery attempt.
    pub fn begin_attempt(at: DateTime<Utc>) -> Self {
        Self {
            increment_attempts: true,
            ..Self::edge(MessageStatus::Enqueued, MessageStatus::Processing, at)
        }
    }

    /// PROCESSING → SENT with the gateway's delivery token.
    pub fn sent(token: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            result: Some(token.into()),
            processed_at: Some(at),
            ..Self::edge(MessageStatus::Processing, MessageStatus::Sent, at)
        }
    }

    /// PROCESSING → FAILED with a human-readable cause.
    pub fn failed(reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            result: Some(reason.into()),
            processed_at: Some(at),
            ..Self::edge(MessageStatus::Processing, MessageStatus::Failed, at)
        }
    }

    pub fn from(&self) -> MessageStatus {
        self.from
    }

    pub fn to(&self) -> MessageStatus {
        self.to
    }

    pub fn increments_attempts(&self) -> bool {
        self.increment_attempts
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Apply to an in-memory record. Returns `false` (record untouched) when the
    /// record is no longer in the expected `from` status.
    pub fn apply(&self, message: &mut QueuedMessage) -> bool {
        if message.status != self.from {
            return false;
        }
        message.status = self.to;
        message.updated_at = self.at;
        if self.increment_attempts {
            message.attempts += 1;
        }
        if let Some(result) = &self.result {
            message.result.clone_from(result);
        }
        if let Some(processed_at) = self.processed_at {
            message.processed_at = Some(processed_at);
        }
        true
    }
}

/// Filters for the administrative message listing.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub status: Option<MessageStatus>,
    /// Case-insensitive substring matched against recipient, sender and body.
    pub search: Option<String>,
    /// Direction of the `scheduled_time` ordering.
    pub sort: Sort,
}

impl MessageFilter {
    pub fn matches(&self, message: &QueuedMessage) -> bool {
        if self.status.is_some_and(|status| status != message.status) {
            return false;
        }
        match self.search.as_deref() {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [&message.recipient, &message.sender, &message.body]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}
