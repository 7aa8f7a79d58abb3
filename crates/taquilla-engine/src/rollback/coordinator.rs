//! The rollback coordinator: unwinds partially-completed purchases.
//!
//! A purchase spans systems that cannot share one ACID transaction (the
//! lock store and the payment gateway), so failure recovery runs as
//! compensating actions: release the seats, mark the payment failed,
//! cancel pending notifications. Every compensation is attempted
//! independently and every failure is surfaced; nothing here silently
//! discards one.

use std::future::Future;
use std::sync::Arc;

use futures::future;
use tracing::{error, info, warn};
use uuid::Uuid;

use taquilla_core::events::LockEvent;
use taquilla_core::result::AppResult;
use taquilla_core::traits::{AuditSink, NotificationChannel, PaymentGateway};
use taquilla_entity::sale::{
    CompensationOutcome, RollbackContext, SaleData, SaleRollbackReport, SeatRef,
    SeatReleaseFailure, SeatReleaseReport,
};

use crate::coordinator::AtomicLockCoordinator;

use super::outcome::TransactionOutcome;

/// Coordinates compensating rollback for the purchase flow.
pub struct RollbackCoordinator {
    locks: Arc<AtomicLockCoordinator>,
    payments: Arc<dyn PaymentGateway>,
    notifications: Arc<dyn NotificationChannel>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for RollbackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackCoordinator").finish()
    }
}

impl RollbackCoordinator {
    /// Creates a new rollback coordinator.
    pub fn new(
        locks: Arc<AtomicLockCoordinator>,
        payments: Arc<dyn PaymentGateway>,
        notifications: Arc<dyn NotificationChannel>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            locks,
            payments,
            notifications,
            audit,
        }
    }

    /// Run `action`; on failure run `compensate` and annotate the result.
    ///
    /// A compensation failure is escalated, never swallowed: it is logged,
    /// reported to the audit collaborator as a critical event, and returned
    /// as [`TransactionOutcome::CriticalFailure`] so the purchase workflow
    /// can alert an operator.
    pub async fn execute_with_rollback<T, C, CF>(
        &self,
        action: impl Future<Output = AppResult<T>>,
        compensate: C,
        context: &RollbackContext,
    ) -> TransactionOutcome<T>
    where
        C: FnOnce() -> CF,
        CF: Future<Output = AppResult<()>>,
    {
        match action.await {
            Ok(value) => TransactionOutcome::Committed(value),
            Err(transaction_error) => {
                warn!(
                    session_id = %context.session_id,
                    error = %transaction_error,
                    "Transaction failed, executing rollback"
                );

                match compensate().await {
                    Ok(()) => TransactionOutcome::RolledBack {
                        error: transaction_error,
                    },
                    Err(rollback_error) => {
                        error!(
                            session_id = %context.session_id,
                            transaction_error = %transaction_error,
                            rollback_error = %rollback_error,
                            "Rollback itself failed; escalating"
                        );
                        self.audit
                            .record(LockEvent::CriticalRollbackFailure {
                                session_id: context.session_id,
                                transaction_error: transaction_error.to_string(),
                                rollback_error: rollback_error.to_string(),
                            })
                            .await;
                        TransactionOutcome::CriticalFailure {
                            error: transaction_error,
                            rollback_error,
                        }
                    }
                }
            }
        }
    }

    /// Release every seat of a failed sale.
    ///
    /// Releases run in parallel; one seat failing never stops the others.
    /// The override flag is set because a rollback unwinds the very
    /// checkout that put the seats into their `reservado` hold. Failures
    /// are collected into the report rather than retried here — the whole
    /// method is idempotent-safe to re-invoke.
    pub async fn rollback_seat_locks(
        &self,
        seats: &[SeatRef],
        context: &RollbackContext,
    ) -> SeatReleaseReport {
        if seats.is_empty() {
            return SeatReleaseReport::empty();
        }

        let session = context.session_id.to_string();
        let attempts = seats.iter().map(|seat| {
            let session = session.as_str();
            async move {
                let Some(funcion_id) = seat.funcion_id.or(context.funcion_id) else {
                    return Err((
                        seat.seat_id.clone(),
                        "seat carries no funcion_id and the context has none".to_string(),
                    ));
                };
                self.locks
                    .unlock(&seat.seat_id, funcion_id, session, true)
                    .await
                    .map_err(|e| (seat.seat_id.clone(), e.to_string()))
            }
        });

        let results = future::join_all(attempts).await;

        let mut failures = Vec::new();
        for result in results {
            if let Err((seat_id, reason)) = result {
                warn!(seat_id, reason, "Failed to release seat during rollback");
                self.emit(LockEvent::SeatReleaseFailed {
                    seat_id: seat_id.clone(),
                    session_id: context.session_id,
                    reason: reason.clone(),
                });
                failures.push(SeatReleaseFailure { seat_id, reason });
            }
        }

        let total = seats.len() as u32;
        let released = total - failures.len() as u32;
        info!(
            session_id = %context.session_id,
            released,
            total,
            "Seat rollback finished"
        );

        SeatReleaseReport {
            released,
            total,
            failures,
        }
    }

    /// Mark the sale's payment transaction as failed.
    ///
    /// Idempotent by the gateway contract; not retried automatically — a
    /// repeated failure is surfaced to the caller through the aggregate
    /// report instead.
    pub async fn rollback_payment_transaction(
        &self,
        transaction_id: Uuid,
        context: &RollbackContext,
    ) -> AppResult<()> {
        let reason = context
            .reason
            .as_deref()
            .unwrap_or("Transaction failed and was rolled back");
        self.payments.mark_failed(transaction_id, reason).await
    }

    /// Unwind a complete sale: seats, payment record, notifications.
    ///
    /// The three compensations are attempted independently so a failure in
    /// one (say, the payment-record update) never blocks seat release.
    pub async fn rollback_complete_sale(
        &self,
        sale: &SaleData,
        context: &RollbackContext,
    ) -> SaleRollbackReport {
        let seats = self.rollback_seat_locks(&sale.seats, context).await;

        let payment = match sale.transaction_id {
            None => CompensationOutcome::Skipped,
            Some(transaction_id) => {
                match self.rollback_payment_transaction(transaction_id, context).await {
                    Ok(()) => CompensationOutcome::Completed,
                    Err(e) => {
                        warn!(
                            transaction_id = %transaction_id,
                            error = %e,
                            "Payment rollback failed"
                        );
                        CompensationOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        let notifications = match sale.notification_id {
            None => CompensationOutcome::Skipped,
            Some(notification_id) => match self.notifications.cancel(notification_id).await {
                Ok(()) => CompensationOutcome::Completed,
                Err(e) => {
                    warn!(
                        notification_id = %notification_id,
                        error = %e,
                        "Notification rollback failed"
                    );
                    CompensationOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            },
        };

        self.emit(LockEvent::SaleRolledBack {
            session_id: context.session_id,
            seats_released: seats.released,
            seats_total: seats.total,
        });

        SaleRollbackReport {
            seats,
            payment,
            notifications,
        }
    }

    /// Emit a domain event without blocking the rollback.
    fn emit(&self, event: LockEvent) {
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            sink.record(event).await;
        });
    }
}
