//! Configuration types for the exchange engine and the reconciliation loop.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunables for the exchange engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Minimum hours a handshake may provision.
    pub min_provisioned_hours: Decimal,
    /// Hours granted to a member at enrollment.
    pub initial_grant_hours: Decimal,
    /// Maximum concurrent active handshakes for a newly registered listing.
    pub default_service_capacity: usize,
    /// Settled-handshake cache size for the idempotency guard.
    pub settled_cache_size: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            min_provisioned_hours: constants::MIN_PROVISIONED_HOURS,
            initial_grant_hours: constants::DEFAULT_INITIAL_GRANT_HOURS,
            default_service_capacity: constants::DEFAULT_SERVICE_CAPACITY,
            settled_cache_size: constants::SETTLEMENT_GUARD_CACHE_SIZE,
        }
    }
}

/// Tunables for the client-side reconciliation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// How often to poll for the authoritative record, in milliseconds.
    pub poll_interval_ms: u64,
    /// Bound on a single request, in milliseconds. A request that exceeds it
    /// is treated as failed; retrying is safe.
    pub request_timeout_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: constants::DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}
