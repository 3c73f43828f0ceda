//! # timebank-reconcile
//!
//! Client-side reconciliation for the polling contract.
//!
//! Clients keep a local cache of the handshakes they watch and refresh it
//! on a fixed cadence. Three pieces make that safe:
//! 1. [`merge`]: pure function; the remote record wins everywhere except
//!    fields the user is editing right now.
//! 2. [`Reconciler`]: tags every fetch with an issuance sequence and
//!    discards results superseded by a newer fetch, so out-of-order
//!    completions cannot roll the cache backwards.
//! 3. [`Poller`]: the tokio loop driving the cadence, with a per-request
//!    timeout after which a fetch is treated as failed and retried.

pub mod merge;
pub mod poller;
pub mod reconciler;

pub use merge::{merge, EditedField};
pub use poller::{PollHandle, Poller, RecordSource};
pub use reconciler::{ApplyOutcome, PollTicket, Reconciler};
