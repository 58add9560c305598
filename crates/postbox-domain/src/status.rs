//! Delivery status of a queued message and the transitions allowed between them.
//!
//! ```text
//! PENDING ──▶ ENQUEUED ──▶ PROCESSING ──▶ SENT
//!    ▲            │              │
//!    └────────────┘              └──────▶ FAILED
//! ```
//!
//! `ENQUEUED → PENDING` is the single recovery edge, taken when the broker push
//! fails after the record was already advanced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Enqueued,
    Processing,
    Sent,
    Failed,
}

impl MessageStatus {
    pub const ALL: [MessageStatus; 5] = [
        Self::Pending,
        Self::Enqueued,
        Self::Processing,
        Self::Sent,
        Self::Failed,
    ];

    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enqueued => "enqueued",
            Self::Processing => "processing",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// `SENT` and `FAILED` accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }

    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        matches!(
            (self, next),
            (Pending, Enqueued)
                | (Enqueued, Pending)
                | (Enqueued, Processing)
                | (Processing, Sent)
                | (Processing, Failed)
        )
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for MessageStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}
