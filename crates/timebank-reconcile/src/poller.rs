//! Async polling loop.
//!
//! Fetches the authoritative record for every watched handshake on a fixed
//! cadence and feeds the results through the [`Reconciler`]. Each fetch is
//! bounded by the configured request timeout; a fetch that fails or times
//! out is simply retried on the next tick, which is safe because every
//! server-side mutation is guarded and settlement is idempotent.

use std::sync::Arc;
use std::time::Duration;

use timebank_types::{Handshake, HandshakeId, ReconcileConfig, Result};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::reconciler::{ApplyOutcome, Reconciler};

/// Where authoritative records come from: an RPC client in deployments, an
/// in-process engine in tests.
pub trait RecordSource: Send + Sync + 'static {
    /// Fetch the authoritative record for one handshake.
    fn fetch(
        &self,
        handshake_id: HandshakeId,
    ) -> impl std::future::Future<Output = Result<Handshake>> + Send;
}

/// Drives the poll cadence for one reconciler.
pub struct Poller<S> {
    source: S,
    reconciler: Arc<Mutex<Reconciler>>,
    config: ReconcileConfig,
}

/// Controls a spawned polling loop.
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Signal the loop to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl<S: RecordSource> Poller<S> {
    /// Create a poller over the given source and reconciler.
    #[must_use]
    pub fn new(source: S, reconciler: Arc<Mutex<Reconciler>>, config: ReconcileConfig) -> Self {
        Self {
            source,
            reconciler,
            config,
        }
    }

    /// Spawn the polling loop on the current runtime.
    #[must_use]
    pub fn spawn(
        source: S,
        reconciler: Arc<Mutex<Reconciler>>,
        config: ReconcileConfig,
    ) -> PollHandle {
        let (shutdown, rx) = watch::channel(false);
        let poller = Self::new(source, reconciler, config);
        let task = tokio::spawn(poller.run(rx));
        PollHandle { shutdown, task }
    }

    /// Run the loop until the shutdown signal fires.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut timer =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        info!(
            interval_ms = self.config.poll_interval_ms,
            "reconciliation loop started"
        );
        loop {
            tokio::select! {
                _ = timer.tick() => self.poll_once().await,
                _ = shutdown.changed() => {
                    info!("reconciliation loop stopping");
                    break;
                }
            }
        }
    }

    /// One poll round: issue a fetch per watched handshake and apply the
    /// results that are still current.
    pub async fn poll_once(&self) {
        let tickets = {
            let mut reconciler = self.reconciler.lock().await;
            reconciler
                .tracked()
                .into_iter()
                .map(|id| reconciler.issue(id))
                .collect::<Vec<_>>()
        };

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        for ticket in tickets {
            let id = ticket.handshake_id();
            match tokio::time::timeout(timeout, self.source.fetch(id)).await {
                Ok(Ok(remote)) => {
                    let mut reconciler = self.reconciler.lock().await;
                    if reconciler.apply(ticket, remote) == ApplyOutcome::Applied {
                        debug!(handshake = %id, "record refreshed");
                    }
                }
                Ok(Err(err)) => {
                    warn!(handshake = %id, %err, "poll fetch failed, will retry next tick");
                }
                Err(_) => {
                    warn!(
                        handshake = %id,
                        timeout_ms = self.config.request_timeout_ms,
                        "poll fetch timed out, will retry next tick"
                    );
                }
            }
        }
    }
}
