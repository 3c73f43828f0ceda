//! Service listing surface.
//!
//! Listings are owned by an external catalog; the engine only reads them to
//! resolve the provider, the default hour commitment, and the concurrency
//! cap. This record is the read-only projection the engine consumes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, ServiceId, UserId};

/// A service offered by a member, as seen by the exchange engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    /// Globally unique listing identifier.
    pub id: ServiceId,
    /// The member offering the service.
    pub provider_id: UserId,
    /// Short human-readable title.
    pub title: String,
    /// Hours a new handshake provisions by default.
    pub default_hours: Decimal,
    /// Maximum concurrent active handshakes on this listing.
    pub capacity: usize,
    /// When the listing was registered.
    pub created_at: DateTime<Utc>,
}

impl ServiceListing {
    /// Register a new listing with the default concurrency cap.
    #[must_use]
    pub fn new(provider_id: UserId, title: impl Into<String>, default_hours: Decimal) -> Self {
        Self {
            id: ServiceId::new(),
            provider_id,
            title: title.into(),
            default_hours,
            capacity: constants::DEFAULT_SERVICE_CAPACITY,
            created_at: Utc::now(),
        }
    }
}

/// Dummy listing for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl ServiceListing {
    /// Create a dummy listing for unit tests.
    pub fn dummy(provider_id: UserId, default_hours: Decimal) -> Self {
        Self::new(provider_id, "bicycle repair", default_hours)
    }
}
