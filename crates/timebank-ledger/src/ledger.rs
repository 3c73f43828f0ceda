//! The hour ledger facade.
//!
//! `HourLedger` is the single write path for everything that touches hours:
//! grants, escrow holds, settlement, dispute compensation, and
//! administrative reversal. Every balance-affecting operation appends chain
//! entries and moves buckets inside the same call, so chains and buckets
//! never drift apart.

use rust_decimal::Decimal;
use timebank_types::{
    EntryId, EntryKind, Handshake, HandshakeId, HourBalance, LedgerEntry, Result, TimebankError,
    UserId,
};

use crate::balances::BalanceBook;
use crate::chain::{ChainStore, EntryDraft};
use crate::guard::SettlementGuard;
use crate::supply::HourSupply;

/// Settlement legs get deterministic entry IDs so a retried settlement
/// produces the same pair. Reversal legs use the next two indexes.
const LEG_SETTLE_DEBIT: u8 = 0;
const LEG_SETTLE_CREDIT: u8 = 1;
const LEG_REVERSE_DEBIT: u8 = 2;
const LEG_REVERSE_CREDIT: u8 = 3;

/// Owns per-member chains, bucket accounting, supply tracking, and the
/// settlement idempotency guard.
pub struct HourLedger {
    chains: ChainStore,
    balances: BalanceBook,
    supply: HourSupply,
    guard: SettlementGuard,
}

impl HourLedger {
    /// Create a new ledger with the given settled-handshake cache size.
    ///
    /// # Panics
    /// Panics if `settled_cache_size` is zero.
    #[must_use]
    pub fn new(settled_cache_size: usize) -> Self {
        Self {
            chains: ChainStore::new(),
            balances: BalanceBook::new(),
            supply: HourSupply::new(),
            guard: SettlementGuard::new(settled_cache_size),
        }
    }

    // =================================================================
    // Grants
    // =================================================================

    /// Grant hours to a member: enrollment grant, admin top-up, or funding
    /// the community pool. The only operation that changes total supply.
    ///
    /// # Errors
    /// Returns `InvalidHours` for non-positive amounts, `LedgerHalted` if
    /// the member's chain is halted.
    pub fn grant(
        &mut self,
        user_id: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<LedgerEntry> {
        if amount <= Decimal::ZERO {
            return Err(TimebankError::InvalidHours(amount));
        }
        let entry = self.chains.append(
            user_id,
            EntryDraft {
                id: EntryId::new(),
                kind: EntryKind::Provision,
                amount,
                description: description.into(),
                handshake_id: None,
                service_id: None,
            },
        )?;
        self.balances.credit(user_id, amount);
        self.supply.record_grant(amount);
        tracing::info!(user = %user_id, %amount, "hours granted");
        Ok(entry)
    }

    // =================================================================
    // Escrow holds (bucket moves, no chain entries)
    // =================================================================

    /// Place an escrow hold on a member's hours.
    ///
    /// # Errors
    /// Returns `LedgerHalted` or `InsufficientHours`.
    pub fn escrow(&mut self, user_id: UserId, amount: Decimal) -> Result<()> {
        self.chains.check_writable(user_id)?;
        self.balances.escrow(user_id, amount)
    }

    /// Release an escrow hold back to available.
    ///
    /// # Errors
    /// Returns `LedgerHalted` or `InsufficientEscrow`.
    pub fn release_escrow(&mut self, user_id: UserId, amount: Decimal) -> Result<()> {
        self.chains.check_writable(user_id)?;
        self.balances.release(user_id, amount)
    }

    // =================================================================
    // Settlement
    // =================================================================

    /// Settle a handshake atomically: consume the requester's escrow and
    /// write the zero-sum transfer pair.
    ///
    /// # Errors
    /// - `AlreadySettled` if the idempotency check fails
    /// - `LedgerHalted` if either member's chain is halted
    /// - `InsufficientEscrow` if the hold does not cover the hours
    pub fn settle(&mut self, handshake: &Handshake) -> Result<(LedgerEntry, LedgerEntry)> {
        self.chains.check_writable(handshake.requester_id)?;
        self.chains.check_writable(handshake.provider_id)?;

        // Idempotency check before any mutation.
        self.guard.mark_settled(handshake.id)?;

        let hours = handshake.provisioned_hours;
        self.balances
            .consume_escrowed(handshake.requester_id, hours)?;

        let debit = self.chains.append(
            handshake.requester_id,
            EntryDraft {
                id: EntryId::deterministic(handshake.id, LEG_SETTLE_DEBIT),
                kind: EntryKind::Transfer,
                amount: -hours,
                description: format!("settlement: {hours}h to {}", handshake.provider_id),
                handshake_id: Some(handshake.id),
                service_id: Some(handshake.service_id),
            },
        )?;

        self.balances.credit(handshake.provider_id, hours);
        let credit = self.chains.append(
            handshake.provider_id,
            EntryDraft {
                id: EntryId::deterministic(handshake.id, LEG_SETTLE_CREDIT),
                kind: EntryKind::Transfer,
                amount: hours,
                description: format!("settlement: {hours}h from {}", handshake.requester_id),
                handshake_id: Some(handshake.id),
                service_id: Some(handshake.service_id),
            },
        )?;

        tracing::info!(
            handshake = %handshake.id,
            requester = %handshake.requester_id,
            provider = %handshake.provider_id,
            %hours,
            "handshake settled"
        );
        Ok((debit, credit))
    }

    /// Administrative reversal of a prior settlement: the provider pays the
    /// hours back to the requester as a refund pair.
    ///
    /// # Errors
    /// Returns `LedgerHalted` or `InsufficientHours` if the provider no
    /// longer holds enough available hours.
    pub fn reverse_settlement(
        &mut self,
        handshake: &Handshake,
    ) -> Result<(LedgerEntry, LedgerEntry)> {
        self.chains.check_writable(handshake.requester_id)?;
        self.chains.check_writable(handshake.provider_id)?;

        let hours = handshake.provisioned_hours;
        self.balances.debit(handshake.provider_id, hours)?;

        let debit = self.chains.append(
            handshake.provider_id,
            EntryDraft {
                id: EntryId::deterministic(handshake.id, LEG_REVERSE_DEBIT),
                kind: EntryKind::Refund,
                amount: -hours,
                description: format!("settlement reversed: {hours}h returned"),
                handshake_id: Some(handshake.id),
                service_id: Some(handshake.service_id),
            },
        )?;

        self.balances.credit(handshake.requester_id, hours);
        let credit = self.chains.append(
            handshake.requester_id,
            EntryDraft {
                id: EntryId::deterministic(handshake.id, LEG_REVERSE_CREDIT),
                kind: EntryKind::Refund,
                amount: hours,
                description: format!("settlement reversed: {hours}h refunded"),
                handshake_id: Some(handshake.id),
                service_id: Some(handshake.service_id),
            },
        )?;

        tracing::warn!(handshake = %handshake.id, %hours, "settlement reversed");
        Ok((debit, credit))
    }

    /// Compensate a reporter from the community pool after an upheld
    /// dispute. Zero-sum adjustment pair; the pool must be funded.
    ///
    /// # Errors
    /// Returns `LedgerHalted` or `InsufficientHours` if the pool cannot
    /// cover the amount.
    pub fn compensate(
        &mut self,
        handshake_id: HandshakeId,
        reporter_id: UserId,
        amount: Decimal,
    ) -> Result<(LedgerEntry, LedgerEntry)> {
        let pool = UserId::community_pool();
        self.chains.check_writable(pool)?;
        self.chains.check_writable(reporter_id)?;

        self.balances.debit(pool, amount)?;
        let debit = self.chains.append(
            pool,
            EntryDraft {
                id: EntryId::new(),
                kind: EntryKind::Adjustment,
                amount: -amount,
                description: format!("dispute compensation: {amount}h to {reporter_id}"),
                handshake_id: Some(handshake_id),
                service_id: None,
            },
        )?;

        self.balances.credit(reporter_id, amount);
        let credit = self.chains.append(
            reporter_id,
            EntryDraft {
                id: EntryId::new(),
                kind: EntryKind::Adjustment,
                amount,
                description: format!("dispute compensation: {amount}h from community pool"),
                handshake_id: Some(handshake_id),
                service_id: None,
            },
        )?;

        tracing::info!(handshake = %handshake_id, reporter = %reporter_id, %amount, "reporter compensated");
        Ok((debit, credit))
    }

    // =================================================================
    // Reads and verification
    // =================================================================

    /// A member's bucket balance.
    #[must_use]
    pub fn balance(&self, user_id: UserId) -> HourBalance {
        self.balances.balance(user_id)
    }

    /// A member's chain entries, oldest first.
    #[must_use]
    pub fn entries(&self, user_id: UserId) -> &[LedgerEntry] {
        self.chains.entries(user_id)
    }

    /// Whether a handshake has already been settled.
    #[must_use]
    pub fn is_settled(&self, handshake_id: &HandshakeId) -> bool {
        self.guard.is_settled(handshake_id)
    }

    /// Whether a member's chain is halted.
    #[must_use]
    pub fn is_halted(&self, user_id: UserId) -> bool {
        self.chains.is_halted(user_id)
    }

    /// Walk a member's chain and cross-check it against the bucket totals.
    /// A failure halts the member.
    ///
    /// # Errors
    /// Returns [`TimebankError::LedgerInconsistency`] on the first broken
    /// link or on chain/bucket drift.
    pub fn verify_chain(&mut self, user_id: UserId) -> Result<()> {
        self.chains.verify(user_id)?;
        let chain_total = self.chains.latest_balance(user_id);
        let bucket_total = self.balances.balance(user_id).total();
        if chain_total != bucket_total {
            return self.chains.halt_with(
                user_id,
                format!("chain total {chain_total} != bucket total {bucket_total}"),
            );
        }
        Ok(())
    }

    /// Verify supply conservation: total granted hours must equal the sum
    /// of every member's buckets.
    ///
    /// # Errors
    /// Returns [`TimebankError::SupplyInvariantViolation`] on mismatch.
    pub fn verify_supply(&self) -> Result<()> {
        self.supply.verify(self.balances.total_supply())
    }

    /// Verify every member's chain, then supply conservation.
    ///
    /// # Errors
    /// Returns the first failure encountered.
    pub fn verify_all(&mut self) -> Result<()> {
        for user_id in self.chains.members() {
            self.verify_chain(user_id)?;
        }
        self.verify_supply()
    }

    /// Tamper helper for verification tests.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn corrupt_balance_after(&mut self, user_id: UserId, seq: usize, value: Decimal) {
        self.chains.corrupt_balance_after(user_id, seq, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timebank_types::Handshake;

    fn funded_pair(ledger: &mut HourLedger, hours: Decimal) -> Handshake {
        let requester = UserId::new();
        let provider = UserId::new();
        ledger
            .grant(requester, Decimal::new(10, 0), "enrollment grant")
            .unwrap();
        ledger
            .grant(provider, Decimal::new(10, 0), "enrollment grant")
            .unwrap();
        Handshake::dummy(requester, provider, hours)
    }

    #[test]
    fn grant_appends_provision_entry() {
        let mut ledger = HourLedger::new(100);
        let user = UserId::new();
        let entry = ledger
            .grant(user, Decimal::new(10, 0), "enrollment grant")
            .unwrap();
        assert_eq!(entry.kind, EntryKind::Provision);
        assert_eq!(entry.balance_after, Decimal::new(10, 0));
        assert_eq!(ledger.balance(user).available, Decimal::new(10, 0));
        assert!(ledger.verify_supply().is_ok());
    }

    #[test]
    fn grant_rejects_non_positive() {
        let mut ledger = HourLedger::new(100);
        let err = ledger
            .grant(UserId::new(), Decimal::ZERO, "bad grant")
            .unwrap_err();
        assert!(matches!(err, TimebankError::InvalidHours(_)));
    }

    #[test]
    fn settle_moves_hours_and_writes_pair() {
        let mut ledger = HourLedger::new(100);
        let hs = funded_pair(&mut ledger, Decimal::new(2, 0));
        ledger.escrow(hs.requester_id, hs.provisioned_hours).unwrap();

        let (debit, credit) = ledger.settle(&hs).unwrap();
        assert_eq!(debit.amount, Decimal::new(-2, 0));
        assert_eq!(credit.amount, Decimal::new(2, 0));
        assert_eq!(debit.id, EntryId::deterministic(hs.id, 0));
        assert_eq!(credit.id, EntryId::deterministic(hs.id, 1));

        assert_eq!(ledger.balance(hs.requester_id).total(), Decimal::new(8, 0));
        assert_eq!(ledger.balance(hs.provider_id).total(), Decimal::new(12, 0));
        assert!(ledger.verify_all().is_ok());
    }

    #[test]
    fn double_settlement_blocked() {
        let mut ledger = HourLedger::new(100);
        let hs = funded_pair(&mut ledger, Decimal::new(2, 0));
        ledger.escrow(hs.requester_id, hs.provisioned_hours).unwrap();
        ledger.settle(&hs).unwrap();

        let err = ledger.settle(&hs).unwrap_err();
        assert!(matches!(err, TimebankError::AlreadySettled(id) if id == hs.id));
        assert!(ledger.is_settled(&hs.id));
        // Balances untouched by the failed retry.
        assert_eq!(ledger.balance(hs.provider_id).total(), Decimal::new(12, 0));
    }

    #[test]
    fn settle_without_escrow_fails() {
        let mut ledger = HourLedger::new(100);
        let hs = funded_pair(&mut ledger, Decimal::new(2, 0));
        let err = ledger.settle(&hs).unwrap_err();
        assert!(matches!(err, TimebankError::InsufficientEscrow));
    }

    #[test]
    fn reverse_settlement_refunds_requester() {
        let mut ledger = HourLedger::new(100);
        let hs = funded_pair(&mut ledger, Decimal::new(3, 0));
        ledger.escrow(hs.requester_id, hs.provisioned_hours).unwrap();
        ledger.settle(&hs).unwrap();

        let (debit, credit) = ledger.reverse_settlement(&hs).unwrap();
        assert_eq!(debit.kind, EntryKind::Refund);
        assert_eq!(credit.kind, EntryKind::Refund);
        assert_eq!(ledger.balance(hs.requester_id).total(), Decimal::new(10, 0));
        assert_eq!(ledger.balance(hs.provider_id).total(), Decimal::new(10, 0));
        assert!(ledger.verify_all().is_ok());
    }

    #[test]
    fn compensation_is_zero_sum() {
        let mut ledger = HourLedger::new(100);
        let pool = UserId::community_pool();
        let reporter = UserId::new();
        ledger.grant(pool, Decimal::new(50, 0), "pool float").unwrap();
        ledger
            .grant(reporter, Decimal::new(10, 0), "enrollment grant")
            .unwrap();

        let supply_before = Decimal::new(60, 0);
        ledger
            .compensate(HandshakeId::new(), reporter, Decimal::new(2, 0))
            .unwrap();

        assert_eq!(ledger.balance(pool).total(), Decimal::new(48, 0));
        assert_eq!(ledger.balance(reporter).total(), Decimal::new(12, 0));
        assert!(ledger.verify_supply().is_ok());
        assert_eq!(
            ledger.balance(pool).total() + ledger.balance(reporter).total(),
            supply_before
        );
    }

    #[test]
    fn compensation_fails_on_unfunded_pool() {
        let mut ledger = HourLedger::new(100);
        let reporter = UserId::new();
        ledger
            .grant(reporter, Decimal::new(10, 0), "enrollment grant")
            .unwrap();
        let err = ledger
            .compensate(HandshakeId::new(), reporter, Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, TimebankError::InsufficientHours { .. }));
    }

    #[test]
    fn tampered_chain_halts_member() {
        let mut ledger = HourLedger::new(100);
        let user = UserId::new();
        ledger.grant(user, Decimal::new(10, 0), "grant").unwrap();
        ledger.corrupt_balance_after(user, 0, Decimal::new(99, 0));

        let err = ledger.verify_chain(user).unwrap_err();
        assert!(matches!(err, TimebankError::LedgerInconsistency { .. }));
        assert!(ledger.is_halted(user));

        let err = ledger.grant(user, Decimal::ONE, "grant").unwrap_err();
        assert!(matches!(err, TimebankError::LedgerHalted(u) if u == user));
        let err = ledger.escrow(user, Decimal::ONE).unwrap_err();
        assert!(matches!(err, TimebankError::LedgerHalted(_)));
    }

    #[test]
    fn escrow_is_not_a_chain_entry() {
        let mut ledger = HourLedger::new(100);
        let user = UserId::new();
        ledger.grant(user, Decimal::new(10, 0), "grant").unwrap();
        ledger.escrow(user, Decimal::new(4, 0)).unwrap();

        assert_eq!(ledger.entries(user).len(), 1);
        assert_eq!(ledger.balance(user).total(), Decimal::new(10, 0));
        assert!(ledger.verify_chain(user).is_ok());

        ledger.release_escrow(user, Decimal::new(4, 0)).unwrap();
        assert_eq!(ledger.entries(user).len(), 1);
    }
}
