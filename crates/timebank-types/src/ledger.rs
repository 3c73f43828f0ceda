//! Ledger entry types for the TimeBank hour-currency audit trail.
//!
//! Every balance-affecting event produces exactly one immutable
//! [`LedgerEntry`] per affected member. Entries are append-only and chained
//! per user: each carries the balance after it was applied, so the whole
//! history can be re-verified from genesis.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EntryId, HandshakeId, ServiceId, UserId};

/// The kind of balance-affecting event this entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// An hour grant: enrollment grant or admin top-up. Always positive.
    Provision,
    /// One leg of a settlement pair: requester debited, provider credited.
    Transfer,
    /// One leg of an administrative settlement reversal.
    Refund,
    /// One leg of a dispute compensation pair, funded by the community pool.
    Adjustment,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provision => write!(f, "PROVISION"),
            Self::Transfer => write!(f, "TRANSFER"),
            Self::Refund => write!(f, "REFUND"),
            Self::Adjustment => write!(f, "ADJUSTMENT"),
        }
    }
}

/// One immutable row in a member's hour ledger.
///
/// Chain invariant, per user and ordered by `seq`:
/// `entry[i].balance_after == entry[i-1].balance_after + entry[i].amount`,
/// with `entry[0].balance_after == entry[0].amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier. Deterministic for settlement legs, random otherwise.
    pub id: EntryId,
    /// The member whose balance this entry affects.
    pub user_id: UserId,
    /// What kind of event produced this entry.
    pub kind: EntryKind,
    /// Signed hour delta. Negative for debits.
    pub amount: Decimal,
    /// The member's total hours after applying this entry.
    pub balance_after: Decimal,
    /// Human-readable context ("settlement of garden help", etc.).
    pub description: String,
    /// The handshake that caused this entry, if any.
    pub handshake_id: Option<HandshakeId>,
    /// The service listing involved, if any.
    pub service_id: Option<ServiceId>,
    /// Position in this member's chain, starting at 0.
    pub seq: u64,
    /// When this entry was appended.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether this entry credits the member.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// SHA-256 digest over the chain-relevant fields, hex-encoded.
    ///
    /// Two entries with the same id, user, position, and balance arithmetic
    /// produce the same digest, so auditors can compare chains without
    /// shipping full rows.
    #[must_use]
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"timebank:entry:v1:");
        hasher.update(self.id.0.as_bytes());
        hasher.update(self.user_id.0.as_bytes());
        hasher.update(self.seq.to_le_bytes());
        hasher.update(self.amount.to_string().as_bytes());
        hasher.update(self.balance_after.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
