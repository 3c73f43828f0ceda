//! Local record cache with issuance-ordered staleness rejection.
//!
//! Polls run concurrently with user actions, so fetch results can complete
//! out of order. Every fetch is tagged with a monotonically increasing
//! issuance sequence at the moment it is issued; a result whose sequence is
//! older than the newest issued for that handshake is discarded. Last
//! writer wins by issuance order, not completion order.

use std::collections::HashMap;

use timebank_types::{Handshake, HandshakeId};

use crate::merge::{merge, EditedField};

/// Tag for one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    handshake_id: HandshakeId,
    seq: u64,
}

impl PollTicket {
    /// The handshake this fetch is for.
    #[must_use]
    pub fn handshake_id(&self) -> HandshakeId {
        self.handshake_id
    }

    /// The issuance sequence assigned to this fetch.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What applying a fetched record did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record was merged into the cache.
    Applied,
    /// A newer fetch was issued since; the result was discarded.
    Stale,
}

/// Client-side cache of handshake records being watched.
#[derive(Debug, Default)]
pub struct Reconciler {
    records: HashMap<HandshakeId, Handshake>,
    active_edits: HashMap<HandshakeId, Vec<EditedField>>,
    latest_issued: HashMap<HandshakeId, u64>,
    next_seq: u64,
}

impl Reconciler {
    /// Create an empty reconciler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching a handshake, seeding the cache with a local snapshot.
    pub fn track(&mut self, record: Handshake) {
        self.records.insert(record.id, record);
    }

    /// Stop watching a handshake and drop its cached state.
    pub fn untrack(&mut self, handshake_id: HandshakeId) {
        self.records.remove(&handshake_id);
        self.active_edits.remove(&handshake_id);
        self.latest_issued.remove(&handshake_id);
    }

    /// Every handshake currently watched.
    #[must_use]
    pub fn tracked(&self) -> Vec<HandshakeId> {
        self.records.keys().copied().collect()
    }

    /// The cached record for a handshake, if watched.
    #[must_use]
    pub fn get(&self, handshake_id: HandshakeId) -> Option<&Handshake> {
        self.records.get(&handshake_id)
    }

    /// Mark a field as mid-edit; polls will keep the local value for it.
    pub fn begin_edit(&mut self, handshake_id: HandshakeId, field: EditedField) {
        let edits = self.active_edits.entry(handshake_id).or_default();
        if !edits.contains(&field) {
            edits.push(field);
        }
    }

    /// Clear a mid-edit mark; the next poll takes the remote value again.
    pub fn end_edit(&mut self, handshake_id: HandshakeId, field: EditedField) {
        if let Some(edits) = self.active_edits.get_mut(&handshake_id) {
            edits.retain(|f| f != &field);
        }
    }

    /// Issue a fetch for a handshake, superseding any fetch still in
    /// flight for it.
    pub fn issue(&mut self, handshake_id: HandshakeId) -> PollTicket {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest_issued.insert(handshake_id, seq);
        PollTicket { handshake_id, seq }
    }

    /// Apply a completed fetch, merging the remote record over the cached
    /// one unless a newer fetch has been issued since.
    pub fn apply(&mut self, ticket: PollTicket, remote: Handshake) -> ApplyOutcome {
        let newest = self
            .latest_issued
            .get(&ticket.handshake_id)
            .copied()
            .unwrap_or(0);
        if ticket.seq < newest {
            tracing::debug!(
                handshake = %ticket.handshake_id,
                seq = ticket.seq,
                newest,
                "stale poll result discarded"
            );
            return ApplyOutcome::Stale;
        }

        let edits = self
            .active_edits
            .get(&ticket.handshake_id)
            .map_or(&[][..], Vec::as_slice);
        let merged = match self.records.get(&ticket.handshake_id) {
            Some(local) => merge(local, remote, edits),
            None => remote,
        };
        tracing::debug!(
            handshake = %ticket.handshake_id,
            revision = merged.revision,
            status = %merged.status,
            "poll result applied"
        );
        self.records.insert(ticket.handshake_id, merged);
        ApplyOutcome::Applied
    }
}
