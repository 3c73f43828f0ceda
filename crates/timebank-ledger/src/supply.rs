//! Hour supply conservation invariant checker.
//!
//! Mathematical invariant enforced after every settlement:
//! ```text
//! Σ(available + escrowed) == Σ(granted hours)
//! ```
//!
//! Transfers, refunds, and adjustments are zero-sum pairs, so only grants
//! change the expected supply. If this invariant ever breaks, the system
//! halts with a critical alert: hours were minted or destroyed outside the
//! grant path.

use rust_decimal::Decimal;
use timebank_types::{Result, TimebankError};

/// Tracks total granted hours and validates conservation after every
/// settlement cycle.
pub struct HourSupply {
    /// Total hours granted since genesis.
    granted: Decimal,
}

impl HourSupply {
    /// Create a new supply tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            granted: Decimal::ZERO,
        }
    }

    /// Record an hour grant.
    pub fn record_grant(&mut self, amount: Decimal) {
        self.granted += amount;
    }

    /// Expected total supply: everything ever granted.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.granted
    }

    /// Verify that the actual supply (sum of all member balances) matches
    /// the expected supply.
    ///
    /// # Errors
    /// Returns [`TimebankError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        if actual_supply != self.granted {
            return Err(TimebankError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {} (total granted)",
                    self.granted
                ),
            });
        }
        Ok(())
    }
}

impl Default for HourSupply {
    fn default() -> Self {
        Self::new()
    }
}
