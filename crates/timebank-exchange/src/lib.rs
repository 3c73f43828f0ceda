//! # timebank-exchange
//!
//! The marketplace core: handshake negotiation, dual-confirmation
//! settlement, and dispute escalation.
//!
//! ## Architecture
//!
//! [`ExchangeEngine`] owns all mutable state and is the only write path.
//! Each operation follows the same shape: resolve the record, validate the
//! caller and the optimistic revision, apply the guarded transition, move
//! hours through the ledger where needed, then emit one notification.
//!
//! Settlement is the sensitive path. It fires only when the confirmation
//! [`Quorum`] over both parties is complete, and it runs through
//! [`settlement::execute`], which checks the ledger's idempotency guard
//! before any mutation. Disputes freeze their handshake out of settlement
//! until an admin resolves the report ([`DisputeResolver`]).

pub mod dispute;
pub mod engine;
pub mod quorum;
pub mod settlement;
pub mod sink;

pub use dispute::DisputeResolver;
pub use engine::ExchangeEngine;
pub use quorum::Quorum;
pub use settlement::SettlementOutcome;
pub use sink::TracingSink;
