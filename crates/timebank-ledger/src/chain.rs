//! Per-member append-only ledger chains.
//!
//! Each member's entries form a chain ordered by `seq`, where every entry
//! carries the balance after it was applied. The chain can be re-verified
//! from genesis at any time; a verification failure halts all further
//! writes for that member until administrative repair. Broken chains are
//! never silently patched.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use timebank_types::{
    EntryId, EntryKind, HandshakeId, LedgerEntry, Result, ServiceId, TimebankError, UserId,
};

/// Owns every member's chain and the halted-member set.
pub struct ChainStore {
    /// Per-member entries, ordered by `seq`.
    chains: HashMap<UserId, Vec<LedgerEntry>>,
    /// Members whose chains failed verification. Writes refused.
    halted: HashSet<UserId>,
}

/// Everything needed to append one entry besides the arithmetic the chain
/// itself supplies (`seq`, `balance_after`).
pub struct EntryDraft {
    pub id: EntryId,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub handshake_id: Option<HandshakeId>,
    pub service_id: Option<ServiceId>,
}

impl ChainStore {
    /// Create a new empty chain store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: HashMap::new(),
            halted: HashSet::new(),
        }
    }

    /// Append one entry to a member's chain, computing `seq` and
    /// `balance_after` from the current tail.
    ///
    /// # Errors
    /// Returns [`TimebankError::LedgerHalted`] if the member's chain is
    /// halted.
    pub fn append(&mut self, user_id: UserId, draft: EntryDraft) -> Result<LedgerEntry> {
        self.check_writable(user_id)?;

        let chain = self.chains.entry(user_id).or_default();
        let (seq, prev_balance) = match chain.last() {
            Some(last) => (last.seq + 1, last.balance_after),
            None => (0, Decimal::ZERO),
        };

        let entry = LedgerEntry {
            id: draft.id,
            user_id,
            kind: draft.kind,
            amount: draft.amount,
            balance_after: prev_balance + draft.amount,
            description: draft.description,
            handshake_id: draft.handshake_id,
            service_id: draft.service_id,
            seq,
            created_at: Utc::now(),
        };
        chain.push(entry.clone());
        Ok(entry)
    }

    /// A member's entries, oldest first.
    #[must_use]
    pub fn entries(&self, user_id: UserId) -> &[LedgerEntry] {
        self.chains.get(&user_id).map_or(&[], Vec::as_slice)
    }

    /// The member's balance according to the chain tail.
    #[must_use]
    pub fn latest_balance(&self, user_id: UserId) -> Decimal {
        self.chains
            .get(&user_id)
            .and_then(|chain| chain.last())
            .map_or(Decimal::ZERO, |entry| entry.balance_after)
    }

    /// Walk a member's chain from genesis and check every link.
    ///
    /// On failure the member is added to the halted set and every
    /// subsequent write for them is refused.
    ///
    /// # Errors
    /// Returns [`TimebankError::LedgerInconsistency`] describing the first
    /// broken link.
    pub fn verify(&mut self, user_id: UserId) -> Result<()> {
        let Some(chain) = self.chains.get(&user_id) else {
            return Ok(());
        };

        let mut running = Decimal::ZERO;
        for (i, entry) in chain.iter().enumerate() {
            if entry.seq != i as u64 {
                return self.halt_with(
                    user_id,
                    format!("entry {} has seq {}, expected {}", entry.id, entry.seq, i),
                );
            }
            running += entry.amount;
            if entry.balance_after != running {
                return self.halt_with(
                    user_id,
                    format!(
                        "entry {} at seq {} has balance_after {}, expected {}",
                        entry.id, entry.seq, entry.balance_after, running
                    ),
                );
            }
        }
        Ok(())
    }

    /// Whether this member's chain is halted.
    #[must_use]
    pub fn is_halted(&self, user_id: UserId) -> bool {
        self.halted.contains(&user_id)
    }

    /// Every member with at least one entry.
    #[must_use]
    pub fn members(&self) -> Vec<UserId> {
        self.chains.keys().copied().collect()
    }

    /// Refuse the write if the member's chain is halted.
    ///
    /// # Errors
    /// Returns [`TimebankError::LedgerHalted`].
    pub fn check_writable(&self, user_id: UserId) -> Result<()> {
        if self.halted.contains(&user_id) {
            return Err(TimebankError::LedgerHalted(user_id));
        }
        Ok(())
    }

    /// Halt a member's chain with the given reason, returning the
    /// inconsistency error. Used when verification fails or when the chain
    /// and bucket views drift apart.
    pub fn halt_with(&mut self, user_id: UserId, reason: String) -> Result<()> {
        tracing::error!(user = %user_id, %reason, "ledger chain verification failed, halting member");
        self.halted.insert(user_id);
        Err(TimebankError::LedgerInconsistency {
            user: user_id,
            reason,
        })
    }

    /// Tamper helper for verification tests: overwrite one entry's
    /// `balance_after`.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn corrupt_balance_after(&mut self, user_id: UserId, seq: usize, value: Decimal) {
        if let Some(entry) = self
            .chains
            .get_mut(&user_id)
            .and_then(|chain| chain.get_mut(seq))
        {
            entry.balance_after = value;
        }
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}
