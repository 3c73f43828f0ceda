//! Hour balance accounting with available/escrowed buckets.
//!
//! Tracks per-member balances. All mutations are atomic: either the full
//! operation succeeds or the balance is unchanged. Escrow holds move hours
//! between buckets; only the ledger facade changes totals.

use std::collections::HashMap;

use rust_decimal::Decimal;
use timebank_types::{HourBalance, Result, TimebankError, UserId};

/// Manages member hour balances with available/escrowed accounting.
///
/// The `BalanceBook` is the source of truth for bucket state. The
/// [`HourLedger`](crate::HourLedger) calls into it while appending chain
/// entries so buckets and chains stay in lockstep.
pub struct BalanceBook {
    /// Per-member balances.
    balances: HashMap<UserId, HourBalance>,
}

impl BalanceBook {
    /// Create a new empty balance book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Credit available hours (grants and settlement receiving side).
    pub fn credit(&mut self, user_id: UserId, amount: Decimal) {
        let entry = self.balances.entry(user_id).or_default();
        entry.available += amount;
    }

    /// Debit available hours (settlement reversal paying side).
    ///
    /// # Errors
    /// Returns `InsufficientHours` if available < amount.
    pub fn debit(&mut self, user_id: UserId, amount: Decimal) -> Result<()> {
        let entry =
            self.balances
                .get_mut(&user_id)
                .ok_or(TimebankError::InsufficientHours {
                    needed: amount,
                    available: Decimal::ZERO,
                })?;

        if entry.available < amount {
            return Err(TimebankError::InsufficientHours {
                needed: amount,
                available: entry.available,
            });
        }

        entry.available -= amount;
        Ok(())
    }

    /// Place an escrow hold (available → escrowed). Used on acceptance.
    ///
    /// # Errors
    /// Returns `InsufficientHours` if available < amount.
    pub fn escrow(&mut self, user_id: UserId, amount: Decimal) -> Result<()> {
        let entry =
            self.balances
                .get_mut(&user_id)
                .ok_or(TimebankError::InsufficientHours {
                    needed: amount,
                    available: Decimal::ZERO,
                })?;

        if entry.available < amount {
            return Err(TimebankError::InsufficientHours {
                needed: amount,
                available: entry.available,
            });
        }

        entry.available -= amount;
        entry.escrowed += amount;
        Ok(())
    }

    /// Release an escrow hold (escrowed → available). Used on cancellation.
    ///
    /// # Errors
    /// Returns `InsufficientEscrow` if escrowed < amount.
    pub fn release(&mut self, user_id: UserId, amount: Decimal) -> Result<()> {
        let entry = self
            .balances
            .get_mut(&user_id)
            .ok_or(TimebankError::InsufficientEscrow)?;

        if entry.escrowed < amount {
            return Err(TimebankError::InsufficientEscrow);
        }

        entry.escrowed -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Consume escrowed hours (for settlement). The escrowed bucket
    /// decreases, nothing is added back to available.
    ///
    /// # Errors
    /// Returns `InsufficientEscrow` if escrowed < amount.
    pub fn consume_escrowed(&mut self, user_id: UserId, amount: Decimal) -> Result<()> {
        let entry = self
            .balances
            .get_mut(&user_id)
            .ok_or(TimebankError::InsufficientEscrow)?;

        if entry.escrowed < amount {
            return Err(TimebankError::InsufficientEscrow);
        }

        entry.escrowed -= amount;
        Ok(())
    }

    /// Get a member's balance.
    #[must_use]
    pub fn balance(&self, user_id: UserId) -> HourBalance {
        self.balances.get(&user_id).cloned().unwrap_or_default()
    }

    /// Total hours in circulation (sum of all members' available + escrowed).
    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.balances.values().map(HourBalance::total).sum()
    }
}

impl Default for BalanceBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_increases_available() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::new(10, 0));
        let bal = book.balance(user);
        assert_eq!(bal.available, Decimal::new(10, 0));
        assert_eq!(bal.escrowed, Decimal::ZERO);
    }

    #[test]
    fn escrow_moves_to_escrowed() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::new(10, 0));
        book.escrow(user, Decimal::new(4, 0)).unwrap();
        let bal = book.balance(user);
        assert_eq!(bal.available, Decimal::new(6, 0));
        assert_eq!(bal.escrowed, Decimal::new(4, 0));
    }

    #[test]
    fn escrow_insufficient_fails() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::ONE);
        let err = book.escrow(user, Decimal::new(2, 0)).unwrap_err();
        assert!(matches!(err, TimebankError::InsufficientHours { .. }));
        // Balance unchanged
        let bal = book.balance(user);
        assert_eq!(bal.available, Decimal::ONE);
        assert_eq!(bal.escrowed, Decimal::ZERO);
    }

    #[test]
    fn release_restores_available() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::new(10, 0));
        book.escrow(user, Decimal::new(4, 0)).unwrap();
        book.release(user, Decimal::new(4, 0)).unwrap();
        let bal = book.balance(user);
        assert_eq!(bal.available, Decimal::new(10, 0));
        assert_eq!(bal.escrowed, Decimal::ZERO);
    }

    #[test]
    fn release_more_than_held_fails() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::new(10, 0));
        book.escrow(user, Decimal::ONE).unwrap();
        let err = book.release(user, Decimal::new(2, 0)).unwrap_err();
        assert!(matches!(err, TimebankError::InsufficientEscrow));
    }

    #[test]
    fn consume_escrowed_reduces_total() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::new(10, 0));
        book.escrow(user, Decimal::new(3, 0)).unwrap();
        book.consume_escrowed(user, Decimal::new(3, 0)).unwrap();
        let bal = book.balance(user);
        assert_eq!(bal.available, Decimal::new(7, 0));
        assert_eq!(bal.escrowed, Decimal::ZERO);
        assert_eq!(bal.total(), Decimal::new(7, 0));
    }

    #[test]
    fn debit_requires_available() {
        let mut book = BalanceBook::new();
        let user = UserId::new();
        book.credit(user, Decimal::new(2, 0));
        book.debit(user, Decimal::ONE).unwrap();
        assert_eq!(book.balance(user).available, Decimal::ONE);
        let err = book.debit(user, Decimal::new(5, 0)).unwrap_err();
        assert!(matches!(err, TimebankError::InsufficientHours { .. }));
    }

    #[test]
    fn total_supply_sums_all_members() {
        let mut book = BalanceBook::new();
        let u1 = UserId::new();
        let u2 = UserId::new();
        book.credit(u1, Decimal::new(10, 0));
        book.credit(u2, Decimal::new(5, 0));
        book.escrow(u1, Decimal::new(3, 0)).unwrap();
        assert_eq!(book.total_supply(), Decimal::new(15, 0));
    }

    #[test]
    fn nonexistent_balance_is_zero() {
        let book = BalanceBook::new();
        assert!(book.balance(UserId::new()).is_zero());
    }
}
