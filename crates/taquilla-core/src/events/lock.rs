//! Seat-lock domain events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to seat locks and purchase rollbacks.
///
/// Emitted fire-and-forget to the audit collaborator; emission must never
/// block or fail the operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LockEvent {
    /// A seat lock was acquired or renewed.
    SeatLocked {
        /// The seat identifier.
        seat_id: String,
        /// The showing the lock applies to.
        funcion_id: i32,
        /// The holding session.
        session_id: Uuid,
        /// The lock status after the operation.
        status: String,
    },
    /// A seat lock was released by its holder.
    SeatUnlocked {
        /// The seat identifier.
        seat_id: String,
        /// The showing the lock applied to.
        funcion_id: i32,
        /// The releasing session.
        session_id: Uuid,
        /// Whether the permanent-status check was overridden.
        overridden: bool,
    },
    /// An expired-lock sweep completed.
    LocksReaped {
        /// Number of locks reclaimed.
        count: u64,
    },
    /// A seat release inside a rollback failed.
    SeatReleaseFailed {
        /// The seat identifier.
        seat_id: String,
        /// The session that held the seats.
        session_id: Uuid,
        /// Why the release failed.
        reason: String,
    },
    /// A complete sale rollback finished.
    SaleRolledBack {
        /// The session whose purchase was unwound.
        session_id: Uuid,
        /// Seats released.
        seats_released: u32,
        /// Seats that should have been released.
        seats_total: u32,
    },
    /// A compensation itself failed; the system could not fully repair the
    /// partial transaction and an operator must look.
    CriticalRollbackFailure {
        /// The session whose purchase was being unwound.
        session_id: Uuid,
        /// The original transaction error.
        transaction_error: String,
        /// The compensation error.
        rollback_error: String,
    },
}

impl LockEvent {
    /// Short event name, as recorded by the audit collaborator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SeatLocked { .. } => "seat_locked",
            Self::SeatUnlocked { .. } => "seat_unlocked",
            Self::LocksReaped { .. } => "locks_reaped",
            Self::SeatReleaseFailed { .. } => "seat_release_failed",
            Self::SaleRolledBack { .. } => "sale_rolled_back",
            Self::CriticalRollbackFailure { .. } => "critical_rollback_failure",
        }
    }
}
