//! Settlement execution.
//!
//! Runs once the confirmation quorum is complete: the ledger writes the
//! zero-sum transfer pair, then the handshake moves to `Completed`. The
//! ledger's idempotency guard is checked before any mutation, so a
//! concurrent or retried settlement degrades to a no-op instead of a
//! double-spend.

use timebank_ledger::HourLedger;
use timebank_types::{Handshake, HandshakeStatus, Result, TimebankError};

/// What a settlement attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The transfer pair was written and the handshake completed.
    Settled,
    /// The handshake was already settled; nothing was written.
    AlreadySettled,
}

/// Settle a fully-confirmed handshake.
///
/// The status check runs first so an illegal settlement never touches the
/// ledger, and the ledger runs before the transition so a ledger refusal
/// never strands a `Completed` handshake without its transfer pair.
///
/// # Errors
/// - [`TimebankError::GuardViolation`] if the handshake cannot complete
///   from its current status
/// - ledger errors (`LedgerHalted`, `InsufficientEscrow`) pass through
pub fn execute(handshake: &mut Handshake, ledger: &mut HourLedger) -> Result<SettlementOutcome> {
    if !handshake
        .status
        .can_transition_to(HandshakeStatus::Completed)
    {
        return Err(TimebankError::GuardViolation {
            action: "settle".to_string(),
            current: handshake.status,
            revision: handshake.revision,
        });
    }

    match ledger.settle(handshake) {
        Ok(_) => {
            handshake.transition_to(HandshakeStatus::Completed)?;
            Ok(SettlementOutcome::Settled)
        }
        Err(TimebankError::AlreadySettled(_)) => Ok(SettlementOutcome::AlreadySettled),
        Err(err) => Err(err),
    }
}
