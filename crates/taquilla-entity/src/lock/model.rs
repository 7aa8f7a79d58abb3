//! Seat-lock entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{LockStatus, LockType};

/// A seat lock row.
///
/// At most one active (non-expired) lock exists per
/// `(seat_id, funcion_id, lock_type)` tuple; the database uniqueness
/// constraint is the enforcement point, not this struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeatLock {
    /// Row identifier.
    pub id: Uuid,
    /// Opaque seat identifier (legacy `silla_` prefix already stripped).
    pub seat_id: String,
    /// The showing this lock applies to.
    pub funcion_id: i32,
    /// Reservation granularity.
    pub lock_type: LockType,
    /// Current lock status.
    pub status: LockStatus,
    /// Canonical session holding the lock.
    pub session_id: Uuid,
    /// Authenticated holder, when known.
    pub user_id: Option<Uuid>,
    /// Temporary locator handed to the buyer on acquisition.
    pub locator: Option<String>,
    /// When the lock was created or last renewed.
    pub locked_at: DateTime<Utc>,
    /// When the lock stops counting as active. `None` means it never
    /// auto-expires (permanent statuses).
    pub expires_at: Option<DateTime<Utc>>,
}

impl SeatLock {
    /// Whether the lock's timer has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }

    /// Whether the lock still counts against availability.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now)
    }

    /// Whether the lock is permanently held: permanent status and not
    /// expired. Only an administrative override removes such a lock.
    pub fn is_permanently_held(&self, now: DateTime<Utc>) -> bool {
        self.status.is_permanent() && self.is_active(now)
    }

    /// Whether the given session owns this lock.
    pub fn is_owned_by(&self, session_id: Uuid) -> bool {
        self.session_id == session_id
    }

    /// Seconds until expiry, if the lock expires at all.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|at| (at - now).num_seconds().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn lock_expiring_in(seconds: i64) -> SeatLock {
        let now = Utc::now();
        SeatLock {
            id: Uuid::new_v4(),
            seat_id: "A1".to_string(),
            funcion_id: 1,
            lock_type: LockType::Seat,
            status: LockStatus::Seleccionado,
            session_id: Uuid::new_v4(),
            user_id: None,
            locator: None,
            locked_at: now,
            expires_at: Some(now + Duration::seconds(seconds)),
        }
    }

    #[test]
    fn test_expiry_predicates() {
        let now = Utc::now();
        let live = lock_expiring_in(60);
        assert!(live.is_active(now));
        assert!(!live.is_expired(now));

        let stale = lock_expiring_in(-60);
        assert!(stale.is_expired(now));
        assert!(!stale.is_permanently_held(now));
    }

    #[test]
    fn test_permanent_hold_requires_active_lock() {
        let now = Utc::now();
        let mut lock = lock_expiring_in(60);
        lock.status = LockStatus::Reservado;
        assert!(lock.is_permanently_held(now));

        lock.expires_at = Some(now - Duration::seconds(1));
        assert!(!lock.is_permanently_held(now));

        lock.status = LockStatus::Pagado;
        lock.expires_at = None;
        assert!(lock.is_permanently_held(now));
    }
}
