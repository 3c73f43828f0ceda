//! Transition notifications.
//!
//! Every successful mutation emits one [`Notification`] through a
//! [`NotificationSink`]. Delivery is fire-and-forget: the engine never
//! waits on a sink and never fails an operation because delivery failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HandshakeId, UserId};

/// What kind of transition a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A requester expressed interest in a listing.
    InterestExpressed,
    /// The provider accepted the request.
    Accepted,
    /// The provider denied the request.
    Denied,
    /// A party cancelled the handshake.
    Cancelled,
    /// A party proposed exchange details.
    DetailsProposed,
    /// The counterparty approved the proposed details.
    DetailsApproved,
    /// The counterparty asked for a revision of the details.
    ChangesRequested,
    /// The provisioned hours were changed.
    HoursRevised,
    /// One party confirmed completion.
    CompletionConfirmed,
    /// Both parties confirmed; hours have been settled.
    Settled,
    /// A dispute report was filed.
    Reported,
    /// An admin paused the handshake pending investigation.
    Paused,
    /// An admin resolved the report.
    ReportResolved,
    /// An admin reversed a prior settlement.
    SettlementReversed,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InterestExpressed => write!(f, "INTEREST_EXPRESSED"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Denied => write!(f, "DENIED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::DetailsProposed => write!(f, "DETAILS_PROPOSED"),
            Self::DetailsApproved => write!(f, "DETAILS_APPROVED"),
            Self::ChangesRequested => write!(f, "CHANGES_REQUESTED"),
            Self::HoursRevised => write!(f, "HOURS_REVISED"),
            Self::CompletionConfirmed => write!(f, "COMPLETION_CONFIRMED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Reported => write!(f, "REPORTED"),
            Self::Paused => write!(f, "PAUSED"),
            Self::ReportResolved => write!(f, "REPORT_RESOLVED"),
            Self::SettlementReversed => write!(f, "SETTLEMENT_REVERSED"),
        }
    }
}

/// One fire-and-forget transition event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// What happened.
    pub kind: NotificationKind,
    /// The handshake it happened to.
    pub handshake_id: HandshakeId,
    /// The member who triggered it, if attributable.
    pub actor: Option<UserId>,
    /// When it was emitted.
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    /// Build a notification stamped with the current time.
    #[must_use]
    pub fn now(kind: NotificationKind, handshake_id: HandshakeId, actor: Option<UserId>) -> Self {
        Self {
            kind,
            handshake_id,
            actor,
            emitted_at: Utc::now(),
        }
    }
}

/// Receives transition notifications. Implementations must not block and
/// must not fail the caller: a lost notification is acceptable, a stalled
/// settlement is not.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification, best-effort.
    fn deliver(&self, notification: Notification);
}

/// Sink that drops everything. Useful when no delivery channel is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn deliver(&self, _notification: Notification) {}
}

/// Sink that buffers notifications in memory, for tests and inspection.
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: std::sync::Mutex<Vec<Notification>>,
}

impl BufferSink {
    /// Create an empty buffer sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// The kinds delivered so far, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.delivered().into_iter().map(|n| n.kind).collect()
    }
}

impl NotificationSink for BufferSink {
    fn deliver(&self, notification: Notification) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(notification);
        }
    }
}
