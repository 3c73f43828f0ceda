//! # timebank-ledger
//!
//! Append-only hour ledger for the TimeBank exchange engine.
//!
//! ## Architecture
//!
//! The ledger keeps two views of every member's hours and never lets them
//! drift:
//! 1. **Chains**: per-member append-only [`LedgerEntry`](timebank_types::LedgerEntry)
//!    rows, each carrying the balance after it was applied. Re-verifiable
//!    from genesis; a broken chain halts the member.
//! 2. **Buckets**: available/escrowed accounting. Escrow holds move hours
//!    between buckets without touching the chain; only grants, transfers,
//!    refunds, and adjustments append entries.
//!
//! Settlement is idempotent ([`SettlementGuard`]) and zero-sum, so the
//! supply invariant holds at all times: total granted hours equal the sum
//! of every member's buckets ([`HourSupply`]).

pub mod balances;
pub mod chain;
pub mod guard;
pub mod ledger;
pub mod supply;

pub use balances::BalanceBook;
pub use chain::{ChainStore, EntryDraft};
pub use guard::SettlementGuard;
pub use ledger::HourLedger;
pub use supply::HourSupply;
