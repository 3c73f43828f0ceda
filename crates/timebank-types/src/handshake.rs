//! # Handshake: the negotiation record between two members
//!
//! A `Handshake` tracks one exchange from first interest through settlement.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ accept  ┌──────────┐ propose ┌───────────┐ both confirm ┌───────────┐
//!   │ PENDING ├────────▶│ ACCEPTED ├────────▶│ INITIATED ├─────────────▶│ COMPLETED │
//!   └────┬────┘         └────┬─────┘         └─────┬─────┘              └───────────┘
//!        │ deny              │                     │ request_changes
//!        ▼                   │                     ▼
//!   ┌────────┐               │          ┌───────────────────┐
//!   │ DENIED │               │          │ CHANGES_REQUESTED │──▶ (re-propose)
//!   └────────┘               │          └───────────────────┘
//!        cancel / report from any non-terminal state:
//!        ──▶ CANCELLED            ──▶ REPORTED ──▶ PAUSED │ prior status
//! ```
//!
//! Transitions are runtime-validated rather than typestate-encoded: a
//! handshake can be cancelled or reported from any non-terminal state, and
//! records round-trip through serde constantly, so a validated enum keeps the
//! model flat while every mutator still rejects illegal moves.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HandshakeId, Result, ServiceId, TimebankError, UserId};

/// The lifecycle status of a handshake.
///
/// `Completed`, `Denied`, and `Cancelled` are terminal: a handshake in one of
/// those states is retained forever and never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandshakeStatus {
    /// Requester expressed interest; awaiting the provider's answer.
    Pending,
    /// Provider accepted; the requester's hours are escrowed.
    Accepted,
    /// Details have been proposed and the exchange is being arranged.
    Initiated,
    /// The counterparty rejected the proposed details and asked for revision.
    ChangesRequested,
    /// Both parties confirmed completion; hours have been settled.
    /// **Irreversible.** Settlement fires exactly once.
    Completed,
    /// Provider declined the request. Terminal.
    Denied,
    /// Either party withdrew before completion. Terminal.
    Cancelled,
    /// A dispute report is open against this handshake.
    Reported,
    /// An admin paused the handshake pending investigation.
    Paused,
}

impl HandshakeStatus {
    /// The set of statuses this one may legally move to.
    ///
    /// `Reported` and `Paused` include the pre-report statuses because a
    /// dismissed report restores the handshake to wherever it was.
    #[must_use]
    pub fn valid_transitions(&self) -> &'static [HandshakeStatus] {
        use HandshakeStatus as S;
        match self {
            S::Pending => &[S::Accepted, S::Denied, S::Cancelled, S::Reported],
            S::Accepted => &[S::Initiated, S::Cancelled, S::Reported],
            S::Initiated => &[
                S::ChangesRequested,
                S::Completed,
                S::Cancelled,
                S::Reported,
            ],
            S::ChangesRequested => &[S::Initiated, S::Cancelled, S::Reported],
            S::Reported => &[
                S::Paused,
                S::Cancelled,
                S::Pending,
                S::Accepted,
                S::Initiated,
                S::ChangesRequested,
            ],
            S::Paused => &[
                S::Cancelled,
                S::Pending,
                S::Accepted,
                S::Initiated,
                S::ChangesRequested,
            ],
            S::Completed | S::Denied | S::Cancelled => &[],
        }
    }

    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Terminal statuses never change again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Denied | Self::Cancelled)
    }

    /// A handshake counts against duplicate / capacity checks while active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Initiated => write!(f, "INITIATED"),
            Self::ChangesRequested => write!(f, "CHANGES_REQUESTED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Denied => write!(f, "DENIED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Reported => write!(f, "REPORTED"),
            Self::Paused => write!(f, "PAUSED"),
        }
    }
}

/// The concrete arrangement for one exchange: where, when, and for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDetails {
    /// Exact meeting location.
    pub location: String,
    /// Exact duration of the exchange in minutes.
    pub duration_minutes: u32,
    /// Agreed start time.
    pub scheduled_for: DateTime<Utc>,
}

/// One negotiation between a requester and a provider over a service listing.
///
/// The record is the single source of truth for the exchange: who proposed
/// the current details, who has approved them, and who has confirmed
/// completion. Every mutation bumps `revision` so concurrent writers can
/// detect that the record moved underneath them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handshake {
    /// Globally unique handshake identifier.
    pub id: HandshakeId,
    /// The service listing this handshake is for.
    pub service_id: ServiceId,
    /// The member requesting the service (debited at settlement).
    pub requester_id: UserId,
    /// The member providing the service (credited at settlement).
    pub provider_id: UserId,
    /// Current lifecycle status.
    pub status: HandshakeStatus,
    /// Hours committed to this exchange. Mutable until settlement,
    /// frozen the instant the status becomes `Completed`.
    pub provisioned_hours: Decimal,
    /// The currently proposed arrangement, if any.
    pub details: Option<ExchangeDetails>,
    /// Whether the non-proposing party approved the current details revision.
    pub details_approved: bool,
    /// The provider proposed the current details revision.
    pub provider_initiated: bool,
    /// The requester proposed the current details revision.
    pub requester_initiated: bool,
    /// Provider's completion confirmation. Settable only by the provider.
    pub provider_confirmed_complete: bool,
    /// Requester's completion confirmation. Settable only by the requester.
    pub receiver_confirmed_complete: bool,
    /// Status saved when a report is filed, restored on dismissal.
    pub prior_status: Option<HandshakeStatus>,
    /// Optimistic-concurrency marker, bumped on every mutation.
    pub revision: u64,
    /// When the handshake was created.
    pub created_at: DateTime<Utc>,
    /// When the handshake was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Handshake {
    /// Create a new handshake in `Pending` with no details proposed.
    #[must_use]
    pub fn new(
        service_id: ServiceId,
        requester_id: UserId,
        provider_id: UserId,
        provisioned_hours: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: HandshakeId::new(),
            service_id,
            requester_id,
            provider_id,
            status: HandshakeStatus::Pending,
            provisioned_hours,
            details: None,
            details_approved: false,
            provider_initiated: false,
            requester_initiated: false,
            provider_confirmed_complete: false,
            receiver_confirmed_complete: false,
            prior_status: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Is this member one of the two parties?
    #[must_use]
    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.requester_id || user == self.provider_id
    }

    /// The other party, if `user` is a participant.
    #[must_use]
    pub fn counterparty(&self, user: UserId) -> Option<UserId> {
        if user == self.requester_id {
            Some(self.provider_id)
        } else if user == self.provider_id {
            Some(self.requester_id)
        } else {
            None
        }
    }

    /// The member who proposed the current details revision, if any.
    #[must_use]
    pub fn current_proposer(&self) -> Option<UserId> {
        if self.provider_initiated {
            Some(self.provider_id)
        } else if self.requester_initiated {
            Some(self.requester_id)
        } else {
            None
        }
    }

    /// Both completion confirmations are in.
    #[must_use]
    pub fn both_confirmed(&self) -> bool {
        self.provider_confirmed_complete && self.receiver_confirmed_complete
    }

    /// Guarded status transition. Bumps `revision` and `updated_at` on success.
    ///
    /// # Errors
    /// Returns [`TimebankError::GuardViolation`] if the move is illegal,
    /// leaving the record untouched.
    pub fn transition_to(&mut self, target: HandshakeStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(TimebankError::GuardViolation {
                action: format!("transition to {target}"),
                current: self.status,
                revision: self.revision,
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Record a details proposal by `proposer`, clearing prior approval and
    /// both completion confirmations. The counterparty must approve afresh.
    pub fn record_proposal(&mut self, proposer: UserId, details: ExchangeDetails) {
        self.details = Some(details);
        self.details_approved = false;
        self.provider_initiated = proposer == self.provider_id;
        self.requester_initiated = proposer == self.requester_id;
        self.reset_confirmations();
    }

    /// Clear both completion confirmations. Called whenever the terms change.
    pub fn reset_confirmations(&mut self) {
        self.provider_confirmed_complete = false;
        self.receiver_confirmed_complete = false;
    }

    /// Bump the revision marker and refresh `updated_at`.
    pub fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    /// Check a caller-supplied expected revision against the record.
    ///
    /// # Errors
    /// Returns [`TimebankError::StaleRevision`] on mismatch.
    pub fn check_revision(&self, expected: Option<u64>) -> Result<()> {
        if let Some(expected) = expected {
            if expected != self.revision {
                return Err(TimebankError::StaleRevision {
                    expected,
                    current: self.revision,
                });
            }
        }
        Ok(())
    }
}

/// Dummy handshake for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Handshake {
    /// Create a dummy handshake for unit tests.
    pub fn dummy(requester_id: UserId, provider_id: UserId, hours: Decimal) -> Self {
        Self::new(ServiceId::new(), requester_id, provider_id, hours)
    }

    /// Create a dummy details proposal for unit tests.
    pub fn dummy_details() -> ExchangeDetails {
        ExchangeDetails {
            location: "community hall, room 2".to_string(),
            duration_minutes: 90,
            scheduled_for: Utc::now()
                + chrono::Duration::days(i64::from(rand::random::<u8>() % 14) + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_hs() -> Handshake {
        Handshake::dummy(UserId::new(), UserId::new(), Decimal::new(15, 1))
    }

    #[test]
    fn pending_transitions() {
        let s = HandshakeStatus::Pending;
        assert!(s.can_transition_to(HandshakeStatus::Accepted));
        assert!(s.can_transition_to(HandshakeStatus::Denied));
        assert!(s.can_transition_to(HandshakeStatus::Cancelled));
        assert!(s.can_transition_to(HandshakeStatus::Reported));
        assert!(!s.can_transition_to(HandshakeStatus::Completed));
        assert!(!s.can_transition_to(HandshakeStatus::Initiated));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for s in [
            HandshakeStatus::Completed,
            HandshakeStatus::Denied,
            HandshakeStatus::Cancelled,
        ] {
            assert!(s.is_terminal());
            assert!(s.valid_transitions().is_empty());
        }
    }

    #[test]
    fn reported_restores_to_prior_states() {
        let s = HandshakeStatus::Reported;
        assert!(s.can_transition_to(HandshakeStatus::Paused));
        assert!(s.can_transition_to(HandshakeStatus::Initiated));
        assert!(s.can_transition_to(HandshakeStatus::Cancelled));
        assert!(!s.can_transition_to(HandshakeStatus::Completed));
    }

    #[test]
    fn status_display_screaming_case() {
        assert_eq!(
            format!("{}", HandshakeStatus::ChangesRequested),
            "CHANGES_REQUESTED"
        );
        assert_eq!(format!("{}", HandshakeStatus::Paused), "PAUSED");
    }

    #[test]
    fn transition_bumps_revision() {
        let mut hs = make_hs();
        assert_eq!(hs.revision, 0);
        hs.transition_to(HandshakeStatus::Accepted).unwrap();
        assert_eq!(hs.status, HandshakeStatus::Accepted);
        assert_eq!(hs.revision, 1);
    }

    #[test]
    fn illegal_transition_leaves_record_untouched() {
        let mut hs = make_hs();
        let err = hs.transition_to(HandshakeStatus::Completed).unwrap_err();
        assert!(matches!(err, TimebankError::GuardViolation { .. }));
        assert_eq!(hs.status, HandshakeStatus::Pending);
        assert_eq!(hs.revision, 0);
    }

    #[test]
    fn proposal_clears_approval_and_confirmations() {
        let mut hs = make_hs();
        hs.status = HandshakeStatus::Initiated;
        hs.details_approved = true;
        hs.provider_confirmed_complete = true;
        hs.record_proposal(hs.requester_id, Handshake::dummy_details());
        assert!(!hs.details_approved);
        assert!(!hs.provider_confirmed_complete);
        assert!(hs.requester_initiated);
        assert!(!hs.provider_initiated);
        assert_eq!(hs.current_proposer(), Some(hs.requester_id));
    }

    #[test]
    fn reproposal_swaps_initiator() {
        let mut hs = make_hs();
        hs.record_proposal(hs.requester_id, Handshake::dummy_details());
        hs.record_proposal(hs.provider_id, Handshake::dummy_details());
        assert!(hs.provider_initiated);
        assert!(!hs.requester_initiated);
        assert_eq!(hs.current_proposer(), Some(hs.provider_id));
    }

    #[test]
    fn counterparty_lookup() {
        let hs = make_hs();
        assert_eq!(hs.counterparty(hs.requester_id), Some(hs.provider_id));
        assert_eq!(hs.counterparty(hs.provider_id), Some(hs.requester_id));
        assert_eq!(hs.counterparty(UserId::new()), None);
    }

    #[test]
    fn revision_check() {
        let hs = make_hs();
        assert!(hs.check_revision(None).is_ok());
        assert!(hs.check_revision(Some(0)).is_ok());
        let err = hs.check_revision(Some(3)).unwrap_err();
        assert!(matches!(
            err,
            TimebankError::StaleRevision {
                expected: 3,
                current: 0
            }
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let mut hs = make_hs();
        hs.record_proposal(hs.provider_id, Handshake::dummy_details());
        let json = serde_json::to_string(&hs).unwrap();
        let back: Handshake = serde_json::from_str(&json).unwrap();
        assert_eq!(hs.id, back.id);
        assert_eq!(hs.status, back.status);
        assert_eq!(hs.provisioned_hours, back.provisioned_hours);
        assert_eq!(hs.details, back.details);
    }
}
