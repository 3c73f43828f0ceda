//! System-wide constants for the TimeBank exchange engine.

use rust_decimal::Decimal;

/// Maximum decimal precision for hour quantities (2 decimal places).
pub const HOURS_PRECISION: u32 = 2;

/// Minimum hours a handshake may provision (0.5).
pub const MIN_PROVISIONED_HOURS: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Hours granted to a member at enrollment (10).
pub const DEFAULT_INITIAL_GRANT_HOURS: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Default maximum concurrent active handshakes per listing.
pub const DEFAULT_SERVICE_CAPACITY: usize = 25;

/// Settlement idempotency cache size (number of handshake IDs to remember).
pub const SETTLEMENT_GUARD_CACHE_SIZE: usize = 100_000;

/// Default reconciliation polling interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default bound on a single reconciliation request in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TimeBank";
