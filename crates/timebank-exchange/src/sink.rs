//! Notification sink backed by the tracing subscriber.

use timebank_types::{Notification, NotificationSink};

/// Emits every notification as a structured `tracing` event. The default
/// sink for deployments that wire delivery elsewhere (push, email) through
/// log shipping rather than in-process fan-out.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: Notification) {
        match notification.actor {
            Some(actor) => tracing::info!(
                kind = %notification.kind,
                handshake = %notification.handshake_id,
                %actor,
                "notification"
            ),
            None => tracing::info!(
                kind = %notification.kind,
                handshake = %notification.handshake_id,
                "notification"
            ),
        }
    }
}
