//! Hour balance types for the TimeBank escrow model.
//!
//! Every member has an `available` balance (usable for new exchanges)
//! and an `escrowed` balance (held by accepted handshakes awaiting
//! settlement). Escrow holds move hours between the buckets; only ledger
//! entries change the total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single member's hour balance, split into spendable and held buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HourBalance {
    /// Available for new exchanges.
    pub available: Decimal,
    /// Held in escrow by accepted handshakes awaiting settlement.
    pub escrowed: Decimal,
}

impl HourBalance {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Decimal::ZERO,
            escrowed: Decimal::ZERO,
        }
    }

    /// Total hours (available + escrowed). Always equals the latest
    /// `balance_after` on this member's ledger chain.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.escrowed
    }

    /// Whether this member holds no hours at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.escrowed.is_zero()
    }
}

impl Default for HourBalance {
    fn default() -> Self {
        Self::new()
    }
}
