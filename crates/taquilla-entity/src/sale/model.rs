//! Sale data handed to the rollback coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a locked seat inside a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRef {
    /// The seat identifier.
    pub seat_id: String,
    /// The showing, when known per seat. Falls back to the rollback
    /// context's `funcion_id` (a cart may carry seats of one showing only).
    #[serde(default)]
    pub funcion_id: Option<i32>,
}

/// Everything the rollback coordinator needs to unwind a partial sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleData {
    /// Seats locked for this sale.
    #[serde(default)]
    pub seats: Vec<SeatRef>,
    /// Payment transaction to mark failed, if one was created.
    #[serde(default)]
    pub transaction_id: Option<Uuid>,
    /// Pending notification to cancel, if one was queued.
    #[serde(default)]
    pub notification_id: Option<Uuid>,
}

/// Context threaded through every rollback call.
///
/// Replaces the original's ambient session state: identity is always
/// explicit here, never read from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackContext {
    /// The session whose purchase is being unwound.
    pub session_id: Uuid,
    /// Default showing for seats that do not carry their own.
    #[serde(default)]
    pub funcion_id: Option<i32>,
    /// Authenticated buyer, when known.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Why the rollback is running (propagated into payment records).
    #[serde(default)]
    pub reason: Option<String>,
    /// When the rollback was requested.
    pub requested_at: DateTime<Utc>,
}

impl RollbackContext {
    /// Create a context for the given session, stamped now.
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            funcion_id: None,
            user_id: None,
            reason: None,
            requested_at: Utc::now(),
        }
    }

    /// Set the default showing.
    pub fn with_funcion(mut self, funcion_id: i32) -> Self {
        self.funcion_id = Some(funcion_id);
        self
    }

    /// Set the failure reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
