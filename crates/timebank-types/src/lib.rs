//! # timebank-types
//!
//! Shared types, errors, and configuration for the **TimeBank** exchange engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`HandshakeId`], [`UserId`], [`ServiceId`], [`ReportId`], [`EntryId`]
//! - **Handshake model**: [`Handshake`], [`HandshakeStatus`], [`ExchangeDetails`]
//! - **Ledger model**: [`LedgerEntry`], [`EntryKind`]
//! - **Report model**: [`Report`], [`IssueType`], [`ReportStatus`], [`ResolutionAction`]
//! - **Service model**: [`ServiceListing`]
//! - **Balance model**: [`HourBalance`]
//! - **Notifications**: [`Notification`], [`NotificationKind`], [`NotificationSink`]
//! - **Configuration**: [`ExchangeConfig`], [`ReconcileConfig`]
//! - **Errors**: [`TimebankError`] with `TB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod handshake;
pub mod ids;
pub mod ledger;
pub mod report;
pub mod service;

// Re-export all primary types at crate root for ergonomic imports:
//   use timebank_types::{Handshake, HandshakeStatus, LedgerEntry, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use handshake::*;
pub use ids::*;
pub use ledger::*;
pub use report::*;
pub use service::*;

// Constants are accessed via `timebank_types::constants::FOO`
// (not re-exported to avoid name collisions).
