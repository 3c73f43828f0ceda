//! N-of-N confirmation quorum.
//!
//! Settlement requires every required party to acknowledge completion. The
//! quorum is a small value type: the engine rebuilds it from the handshake's
//! persisted confirmation flags whenever it needs to evaluate completeness,
//! so the handshake record stays the single source of truth.

use std::collections::BTreeSet;

use timebank_types::{Result, TimebankError, UserId};

/// Tracks which of a fixed set of required members have acknowledged.
///
/// Complete only when every required member has acknowledged. Acknowledging
/// twice is a no-op; acknowledging as a non-required member is refused.
#[derive(Debug, Clone)]
pub struct Quorum {
    required: BTreeSet<UserId>,
    acknowledged: BTreeSet<UserId>,
}

impl Quorum {
    /// Build a quorum over the given required members.
    pub fn new(required: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            required: required.into_iter().collect(),
            acknowledged: BTreeSet::new(),
        }
    }

    /// Record one member's acknowledgement. Idempotent per member.
    ///
    /// # Errors
    /// Returns [`TimebankError::NotAParticipant`] if `user` is not one of
    /// the required members.
    pub fn acknowledge(&mut self, user: UserId) -> Result<()> {
        if !self.required.contains(&user) {
            return Err(TimebankError::NotAParticipant(user));
        }
        self.acknowledged.insert(user);
        Ok(())
    }

    /// Every required member has acknowledged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.acknowledged.len() == self.required.len()
    }

    /// Required members that have not yet acknowledged.
    #[must_use]
    pub fn pending(&self) -> Vec<UserId> {
        self.required
            .difference(&self.acknowledged)
            .copied()
            .collect()
    }

    /// Number of acknowledgements received so far.
    #[must_use]
    pub fn acknowledged_count(&self) -> usize {
        self.acknowledged.len()
    }
}
