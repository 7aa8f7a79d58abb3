//! Expired-lock reaper — periodic caller of the coordinator's sweep.
//!
//! Adds no semantics beyond scheduling. Multiple instances may run
//! concurrently across processes: the underlying sweep is idempotent and
//! the coordinator sheds sweeps that arrive too close together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info};

use taquilla_core::config::worker::WorkerConfig;
use taquilla_engine::AtomicLockCoordinator;

/// Periodic expired-lock sweeper.
#[derive(Debug)]
pub struct ExpirationReaper {
    /// Coordinator whose `cleanup_expired` does the actual work.
    coordinator: Arc<AtomicLockCoordinator>,
    /// Worker configuration.
    config: WorkerConfig,
}

impl ExpirationReaper {
    /// Create a new reaper.
    pub fn new(coordinator: Arc<AtomicLockCoordinator>, config: WorkerConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Run a single sweep. Exposed for tests and one-shot maintenance.
    pub async fn run_once(&self) -> u64 {
        let report = self.coordinator.cleanup_expired().await;
        debug!(cleaned = report.cleaned, "Reaper sweep finished");
        report.cleaned
    }

    /// Run sweeps until the cancel signal flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let interval = Duration::from_secs(self.config.sweep_interval_seconds);
        info!(
            interval_seconds = self.config.sweep_interval_seconds,
            "Expiration reaper started"
        );

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!("Expiration reaper received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(interval) => {
                    self.run_once().await;
                }
            }
        }

        info!("Expiration reaper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    use taquilla_core::config::locks::LockConfig;
    use taquilla_database::store::{LockRequest, LockStore, MemoryLockStore};
    use taquilla_engine::audit::TracingAuditSink;
    use taquilla_entity::lock::LockStatus;
    use uuid::Uuid;

    fn coordinator(store: Arc<MemoryLockStore>) -> Arc<AtomicLockCoordinator> {
        let config = LockConfig {
            cleanup_min_interval_seconds: 0,
            ..LockConfig::default()
        };
        Arc::new(AtomicLockCoordinator::new(
            store,
            Arc::new(TracingAuditSink::new()),
            config,
        ))
    }

    #[tokio::test]
    async fn test_run_once_reclaims_expired_locks() {
        let store = Arc::new(MemoryLockStore::new());
        store
            .try_lock(&LockRequest::new(
                "A1",
                1,
                Uuid::new_v4(),
                LockStatus::Seleccionado,
                Some(StdDuration::from_secs(0)),
            ))
            .await
            .expect("store");

        let reaper = ExpirationReaper::new(coordinator(store), WorkerConfig::default());
        assert_eq!(reaper.run_once().await, 1);
        // A second sweep finds nothing; reaping is idempotent.
        assert_eq!(reaper.run_once().await, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let store = Arc::new(MemoryLockStore::new());
        let reaper = ExpirationReaper::new(
            coordinator(store),
            WorkerConfig {
                enabled: true,
                sweep_interval_seconds: 3600,
            },
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { reaper.run(rx).await });

        tx.send(true).expect("send shutdown");
        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .expect("reaper shuts down promptly")
            .expect("reaper task completes");
    }
}
