//! Contracts for the out-of-scope peripheral systems the engine talks to.
//!
//! Ticket rendering, delivery, pricing, and the payment gateway proper all
//! live elsewhere; the engine only consumes the narrow capabilities below.

use async_trait::async_trait;
use uuid::Uuid;

use crate::events::LockEvent;
use crate::result::AppResult;

/// Payment-record capability consumed by the rollback coordinator.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Mark a payment transaction as failed.
    ///
    /// Must be idempotent: marking an already-failed transaction failed
    /// again is a no-op.
    async fn mark_failed(&self, transaction_id: Uuid, reason: &str) -> AppResult<()>;
}

/// Notification capability consumed by the rollback coordinator.
#[async_trait]
pub trait NotificationChannel: Send + Sync + 'static {
    /// Cancel a pending notification. Best-effort.
    async fn cancel(&self, notification_id: Uuid) -> AppResult<()>;
}

/// Audit capability. Recording is infallible from the caller's point of
/// view: implementations swallow and log their own failures, and callers
/// emit events from a spawned task so the operation never waits on them.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    /// Record a domain event.
    async fn record(&self, event: LockEvent);
}
