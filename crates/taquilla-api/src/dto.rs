//! Request and response DTOs.
//!
//! Lock identifiers arrive as raw JSON values: the old clients send seat
//! ids as plain strings, numbers, or whole seat objects, and funcion ids as
//! numbers or numeric strings. Normalization happens in the engine's
//! identity module, so these DTOs stay permissive on purpose.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use taquilla_entity::lock::LockStatus;
use taquilla_entity::sale::SaleData;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// POST /api/locks
#[derive(Debug, Clone, Deserialize)]
pub struct LockRequestBody {
    /// Seat identifier: string, number, or legacy seat object.
    pub seat_id: Value,
    /// Funcion identifier: number or numeric string.
    pub funcion_id: Value,
    /// Caller-supplied session token.
    pub session_id: String,
    /// Requested status; defaults to a browsing hold.
    #[serde(default)]
    pub status: Option<LockStatus>,
}

/// DELETE /api/locks
#[derive(Debug, Clone, Deserialize)]
pub struct UnlockRequestBody {
    /// Seat identifier.
    pub seat_id: Value,
    /// Funcion identifier.
    pub funcion_id: Value,
    /// Caller-supplied session token.
    pub session_id: String,
    /// Set by authorized callers to remove permanent locks.
    #[serde(default)]
    pub allow_permanent_override: bool,
}

/// GET /api/locks/availability
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    /// Seat identifier.
    pub seat_id: String,
    /// Funcion identifier.
    pub funcion_id: i32,
    /// When present, this session's own lock does not count against
    /// availability.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// GET /api/locks/status
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    /// Seat identifier.
    pub seat_id: String,
    /// Funcion identifier.
    pub funcion_id: i32,
}

/// POST /api/sales/rollback
#[derive(Debug, Clone, Deserialize)]
pub struct RollbackSaleBody {
    /// The partial sale to unwind.
    pub sale: SaleData,
    /// Rollback context.
    pub context: RollbackContextBody,
}

/// Client-facing rollback context (timestamps are assigned server-side).
#[derive(Debug, Clone, Deserialize)]
pub struct RollbackContextBody {
    /// Session whose purchase is being unwound.
    pub session_id: String,
    /// Default funcion for seats that do not carry their own.
    #[serde(default)]
    pub funcion_id: Option<i32>,
    /// Authenticated buyer, when known.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Why the rollback is running.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of a successful unlock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    /// Always true; the seat no longer holds a lock for this session.
    pub released: bool,
}

/// Body of an availability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Whether the seat can be offered.
    pub available: bool,
}

/// Body of a health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}
