//! Shared test doubles for the engine integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use taquilla_core::config::locks::{LockConfig, RateLimitConfig};
use taquilla_core::error::AppError;
use taquilla_core::events::LockEvent;
use taquilla_core::result::AppResult;
use taquilla_core::traits::{AuditSink, NotificationChannel, PaymentGateway};
use taquilla_database::store::{
    LockRequest, LockStore, MemoryLockStore, TryLockOutcome, UnlockOutcome,
};
use taquilla_engine::{AtomicLockCoordinator, RollbackCoordinator};
use taquilla_entity::lock::SeatLock;

/// Lock config with effectively unlimited rate limiting and no sweep gate,
/// so tests exercise one mechanism at a time.
pub fn permissive_config() -> LockConfig {
    LockConfig {
        cleanup_min_interval_seconds: 0,
        rate_limit: RateLimitConfig {
            max_tokens: 10_000,
            refill_per_second: 10_000.0,
        },
        ..LockConfig::default()
    }
}

pub fn coordinator_with(
    store: Arc<dyn LockStore>,
    audit: Arc<dyn AuditSink>,
    config: LockConfig,
) -> Arc<AtomicLockCoordinator> {
    Arc::new(AtomicLockCoordinator::new(store, audit, config))
}

/// Store wrapper that injects faults into chosen primitives.
pub struct FlakyLockStore {
    inner: MemoryLockStore,
    /// Seat whose unlock always fails at the storage layer.
    pub fail_unlock_for: Option<String>,
    /// When set, availability checks fail.
    pub fail_available: bool,
}

impl FlakyLockStore {
    pub fn wrapping(inner: MemoryLockStore) -> Self {
        Self {
            inner,
            fail_unlock_for: None,
            fail_available: false,
        }
    }

    pub fn failing_unlock_for(seat_id: &str) -> Self {
        Self {
            inner: MemoryLockStore::new(),
            fail_unlock_for: Some(seat_id.to_string()),
            fail_available: false,
        }
    }

    pub fn failing_availability() -> Self {
        Self {
            inner: MemoryLockStore::new(),
            fail_unlock_for: None,
            fail_available: true,
        }
    }
}

#[async_trait]
impl LockStore for FlakyLockStore {
    async fn try_lock(&self, req: &LockRequest) -> AppResult<TryLockOutcome> {
        self.inner.try_lock(req).await
    }

    async fn unlock(
        &self,
        seat_id: &str,
        funcion_id: i32,
        session_id: Uuid,
        override_permanent: bool,
    ) -> AppResult<UnlockOutcome> {
        if self.fail_unlock_for.as_deref() == Some(seat_id) {
            return Err(AppError::database("simulated unlock failure"));
        }
        self.inner
            .unlock(seat_id, funcion_id, session_id, override_permanent)
            .await
    }

    async fn is_available(
        &self,
        seat_id: &str,
        funcion_id: i32,
        excluding_session: Option<Uuid>,
    ) -> AppResult<bool> {
        if self.fail_available {
            return Err(AppError::database("simulated availability failure"));
        }
        self.inner
            .is_available(seat_id, funcion_id, excluding_session)
            .await
    }

    async fn get_status(&self, seat_id: &str, funcion_id: i32) -> AppResult<Option<SeatLock>> {
        self.inner.get_status(seat_id, funcion_id).await
    }

    async fn reap_expired(&self) -> AppResult<u64> {
        self.inner.reap_expired().await
    }
}

/// Audit sink that remembers every event it saw.
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<LockEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().await.iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(&self, event: LockEvent) {
        self.events.lock().await.push(event);
    }
}

/// Payment gateway double that records calls and can be told to fail.
#[derive(Default)]
pub struct RecordingPayment {
    pub fail: bool,
    calls: Mutex<Vec<Uuid>>,
}

impl RecordingPayment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingPayment {
    async fn mark_failed(&self, transaction_id: Uuid, _reason: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::external_service("payment service unreachable"));
        }
        self.calls.lock().await.push(transaction_id);
        Ok(())
    }
}

/// Notification channel double.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    calls: Mutex<Vec<Uuid>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingNotifier {
    async fn cancel(&self, notification_id: Uuid) -> AppResult<()> {
        if self.fail {
            return Err(AppError::external_service("notification service down"));
        }
        self.calls.lock().await.push(notification_id);
        Ok(())
    }
}

/// A full rollback coordinator over the given store, with recording doubles.
pub struct RollbackHarness {
    pub coordinator: Arc<AtomicLockCoordinator>,
    pub rollback: RollbackCoordinator,
    pub payments: Arc<RecordingPayment>,
    pub notifications: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAudit>,
}

pub fn rollback_harness(store: Arc<dyn LockStore>) -> RollbackHarness {
    rollback_harness_with(store, RecordingPayment::new(), RecordingNotifier::new())
}

pub fn rollback_harness_with(
    store: Arc<dyn LockStore>,
    payments: RecordingPayment,
    notifications: RecordingNotifier,
) -> RollbackHarness {
    let audit = Arc::new(RecordingAudit::new());
    let payments = Arc::new(payments);
    let notifications = Arc::new(notifications);
    let coordinator = coordinator_with(store, audit.clone(), permissive_config());
    let rollback = RollbackCoordinator::new(
        Arc::clone(&coordinator),
        payments.clone(),
        notifications.clone(),
        audit.clone(),
    );
    RollbackHarness {
        coordinator,
        rollback,
        payments,
        notifications,
        audit,
    }
}
