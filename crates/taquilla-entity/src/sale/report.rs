//! Rollback result reporting.
//!
//! Nothing in the rollback path silently discards a failure: every
//! compensation's outcome, good or bad, lands in one of these reports.

use serde::{Deserialize, Serialize};

/// Outcome of releasing the seats of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatReleaseReport {
    /// Seats actually released (or already free).
    pub released: u32,
    /// Seats the rollback attempted.
    pub total: u32,
    /// Per-seat failures. Empty on full success.
    pub failures: Vec<SeatReleaseFailure>,
}

impl SeatReleaseReport {
    /// A report for an empty seat list.
    pub fn empty() -> Self {
        Self {
            released: 0,
            total: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every attempted release succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single seat that could not be released.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatReleaseFailure {
    /// The seat identifier.
    pub seat_id: String,
    /// Why the release failed.
    pub reason: String,
}

/// Outcome of one compensation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompensationOutcome {
    /// Nothing to compensate (e.g. no transaction was ever created).
    Skipped,
    /// Compensation applied.
    Completed,
    /// Compensation failed; surfaced to the caller, not retried here.
    Failed {
        /// The failure description.
        reason: String,
    },
}

impl CompensationOutcome {
    /// Whether this step ended in failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Aggregate outcome of a complete sale rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRollbackReport {
    /// Seat release results.
    pub seats: SeatReleaseReport,
    /// Payment-record compensation result.
    pub payment: CompensationOutcome,
    /// Notification compensation result.
    pub notifications: CompensationOutcome,
}

impl SaleRollbackReport {
    /// Whether every sub-rollback fully succeeded (or was skipped).
    pub fn is_clean(&self) -> bool {
        self.seats.is_complete() && !self.payment.is_failed() && !self.notifications.is_failed()
    }
}
