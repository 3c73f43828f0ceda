//! Error types for the TimeBank exchange engine.
//!
//! All errors use the `TB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Handshake errors
//! - 2xx: Balance / ledger errors
//! - 3xx: Service listing errors
//! - 4xx: Report / dispute errors
//! - 5xx: Settlement errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{HandshakeId, HandshakeStatus, ReportId, ServiceId, UserId};

/// Central error enum for all TimeBank operations.
#[derive(Debug, Error)]
pub enum TimebankError {
    // =================================================================
    // Handshake Errors (1xx)
    // =================================================================
    /// The requested handshake was not found.
    #[error("TB_ERR_100: Handshake not found: {0}")]
    HandshakeNotFound(HandshakeId),

    /// The action is not legal for the current actor / status combination.
    /// Carries the authoritative state so the caller can resync.
    #[error("TB_ERR_101: Guard violation: {action} not permitted (status {current}, revision {revision})")]
    GuardViolation {
        action: String,
        current: HandshakeStatus,
        revision: u64,
    },

    /// An active handshake already exists for this (service, requester) pair.
    #[error("TB_ERR_102: Active handshake already exists for service {service} and requester {requester}")]
    DuplicateActiveHandshake {
        service: ServiceId,
        requester: UserId,
    },

    /// Optimistic-concurrency check failed: the record moved underneath the caller.
    #[error("TB_ERR_103: Stale revision: expected {expected}, current {current}")]
    StaleRevision { expected: u64, current: u64 },

    /// The actor is neither party to the handshake (nor an admin where required).
    #[error("TB_ERR_104: Actor {0} is not a participant in this handshake")]
    NotAParticipant(UserId),

    /// Provisioned hours below the minimum exchangeable quantity.
    #[error("TB_ERR_105: Invalid hours: {0} (minimum 0.5)")]
    InvalidHours(Decimal),

    /// A member attempted to exchange with themselves.
    #[error("TB_ERR_106: Self-exchange blocked: requester and provider are the same member")]
    SelfExchangeBlocked,

    // =================================================================
    // Balance / Ledger Errors (2xx)
    // =================================================================
    /// Not enough available hours to perform the operation.
    #[error("TB_ERR_200: Insufficient available hours: need {needed}, have {available}")]
    InsufficientHours { needed: Decimal, available: Decimal },

    /// Not enough escrowed hours to release or consume.
    #[error("TB_ERR_201: Insufficient escrowed hours")]
    InsufficientEscrow,

    /// A user's ledger chain failed verification. Fatal for that user.
    #[error("TB_ERR_202: Ledger inconsistency for user {user}: {reason}")]
    LedgerInconsistency { user: UserId, reason: String },

    /// Writes refused: the user's chain is halted pending administrative repair.
    #[error("TB_ERR_203: Ledger halted for user {0}")]
    LedgerHalted(UserId),

    // =================================================================
    // Service Listing Errors (3xx)
    // =================================================================
    /// The requested service listing was not found.
    #[error("TB_ERR_300: Service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// The listing's concurrent-handshake capacity is exhausted.
    #[error("TB_ERR_301: Service at capacity: {0}")]
    ServiceAtCapacity(ServiceId),

    // =================================================================
    // Report / Dispute Errors (4xx)
    // =================================================================
    /// The requested report was not found.
    #[error("TB_ERR_400: Report not found: {0}")]
    ReportNotFound(ReportId),

    /// Settlement attempted while a report is pending on the handshake.
    #[error("TB_ERR_401: Dispute open on handshake {0}")]
    DisputeOpen(HandshakeId),

    /// An open report already exists for this handshake.
    #[error("TB_ERR_402: Open report already exists for handshake {0}")]
    DuplicateReport(HandshakeId),

    /// Resolution attempted on a report that is no longer pending.
    #[error("TB_ERR_403: Report already resolved: {0}")]
    ReportAlreadyResolved(ReportId),

    // =================================================================
    // Settlement Errors (5xx)
    // =================================================================
    /// The handshake has already been settled (idempotency guard).
    #[error("TB_ERR_500: Handshake already settled: {0}")]
    AlreadySettled(HandshakeId),

    /// Supply conservation invariant violated: granted hours no longer match
    /// the sum of member balances. Critical safety alert.
    #[error("TB_ERR_501: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// I/O error (disk, network).
    #[error("TB_ERR_901: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TimebankError>;

// Conversion from std::io::Error
impl From<std::io::Error> for TimebankError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = TimebankError::HandshakeNotFound(HandshakeId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("TB_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_hours_display() {
        let err = TimebankError::InsufficientHours {
            needed: Decimal::new(25, 1),
            available: Decimal::new(10, 1),
        };
        let msg = format!("{err}");
        assert!(msg.contains("TB_ERR_200"));
        assert!(msg.contains("2.5"));
        assert!(msg.contains("1.0"));
    }

    #[test]
    fn guard_violation_carries_authoritative_state() {
        let err = TimebankError::GuardViolation {
            action: "accept".into(),
            current: HandshakeStatus::Completed,
            revision: 7,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TB_ERR_101"));
        assert!(msg.contains("COMPLETED"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn all_errors_have_tb_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(TimebankError::InsufficientEscrow),
            Box::new(TimebankError::SelfExchangeBlocked),
            Box::new(TimebankError::LedgerHalted(UserId::new())),
            Box::new(TimebankError::DisputeOpen(HandshakeId::new())),
            Box::new(TimebankError::Internal("test".into())),
            Box::new(TimebankError::StaleRevision {
                expected: 1,
                current: 2,
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("TB_ERR_"),
                "Error missing TB_ERR_ prefix: {msg}"
            );
        }
    }
}
