//! The seat-lock store: the only component allowed to mutate seat-lock
//! rows, and the only place the uniqueness invariant is enforced.
//!
//! Every primitive is indivisible with respect to other concurrent calls on
//! the same `(seat_id, funcion_id, lock_type)` tuple. Two implementations
//! are provided:
//! - Postgres (single-statement compare-and-set, multi-node)
//! - In-memory (`tokio::sync::Mutex`, single node and tests)

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rand::RngExt;
use uuid::Uuid;

use taquilla_core::result::AppResult;
use taquilla_entity::lock::{LockStatus, LockType, SeatLock};

pub use memory::MemoryLockStore;
pub use postgres::PgLockStore;

/// Parameters of a single atomic lock attempt.
#[derive(Debug, Clone)]
pub struct LockRequest {
    /// Normalized seat identifier.
    pub seat_id: String,
    /// The showing to lock the seat for.
    pub funcion_id: i32,
    /// Reservation granularity.
    pub lock_type: LockType,
    /// Canonical session acquiring the lock.
    pub session_id: Uuid,
    /// Authenticated holder, when known.
    pub user_id: Option<Uuid>,
    /// Status to record.
    pub status: LockStatus,
    /// Time until the lock stops counting as active. `None` for statuses
    /// that never auto-expire.
    pub ttl: Option<Duration>,
}

impl LockRequest {
    /// Build a request for a single seat with the given session and status.
    pub fn new(
        seat_id: impl Into<String>,
        funcion_id: i32,
        session_id: Uuid,
        status: LockStatus,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            seat_id: seat_id.into(),
            funcion_id,
            lock_type: LockType::Seat,
            session_id,
            user_id: None,
            status,
            ttl,
        }
    }

    /// Attach the authenticated holder.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Why a `try_lock` CAS lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An active lock is held by a different session.
    OwnedByOther,
    /// The existing lock has a permanent status and has not expired; it
    /// cannot be taken over or mutated, not even by its own session.
    Permanent,
}

/// Outcome of a `try_lock` call.
#[derive(Debug, Clone)]
pub enum TryLockOutcome {
    /// No active lock existed; a fresh one was inserted.
    Acquired(SeatLock),
    /// The same session already held the lock; it was renewed (and possibly
    /// transitioned forward).
    Renewed(SeatLock),
    /// The CAS lost against an existing active lock.
    Conflict {
        /// The lock that won.
        existing: SeatLock,
        /// Why it cannot be replaced.
        kind: ConflictKind,
    },
}

impl TryLockOutcome {
    /// The lock record on either success path.
    pub fn record(&self) -> Option<&SeatLock> {
        match self {
            Self::Acquired(lock) | Self::Renewed(lock) => Some(lock),
            Self::Conflict { .. } => None,
        }
    }
}

/// Outcome of an `unlock` call.
#[derive(Debug, Clone)]
pub enum UnlockOutcome {
    /// The lock was removed.
    Released(SeatLock),
    /// No lock existed for the tuple; releasing nothing is a no-op so the
    /// rollback path can be re-invoked safely.
    NotHeld,
    /// The lock belongs to a different session.
    NotOwner(SeatLock),
    /// The lock is permanently held and the override flag was not set.
    Permanent(SeatLock),
}

/// Atomic seat-lock primitives.
///
/// Application code never reads-then-writes lock rows around these calls;
/// any "check availability, then lock" sequence in callers is advisory only.
#[async_trait]
pub trait LockStore: Send + Sync + 'static {
    /// Insert a new active lock only if no active, non-expired lock exists
    /// for the tuple. Same-session re-acquisition renews idempotently; an
    /// expired row of any status is replaceable.
    async fn try_lock(&self, req: &LockRequest) -> AppResult<TryLockOutcome>;

    /// Remove the lock if it is owned by `session_id` and not permanently
    /// held (unless `override_permanent` is set by an authorized caller).
    async fn unlock(
        &self,
        seat_id: &str,
        funcion_id: i32,
        session_id: Uuid,
        override_permanent: bool,
    ) -> AppResult<UnlockOutcome>;

    /// Whether no active lock exists for the tuple, or the only active lock
    /// belongs to `excluding_session`.
    async fn is_available(
        &self,
        seat_id: &str,
        funcion_id: i32,
        excluding_session: Option<Uuid>,
    ) -> AppResult<bool>;

    /// The current lock row for the tuple, expired or not.
    async fn get_status(&self, seat_id: &str, funcion_id: i32) -> AppResult<Option<SeatLock>>;

    /// Remove all expired locks whose status is not permanent. Expired
    /// checkout holds (`reservado`) are left for the purchase workflow to
    /// finalize or roll back; readers already treat them as free.
    async fn reap_expired(&self) -> AppResult<u64>;
}

const LOCATOR_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const LOCATOR_LEN: usize = 8;

/// Generate the temporary locator handed to the buyer on acquisition.
pub(crate) fn generate_locator() -> String {
    let mut rng = rand::rng();
    (0..LOCATOR_LEN)
        .map(|_| LOCATOR_ALPHABET[rng.random_range(0..LOCATOR_ALPHABET.len())] as char)
        .collect()
}
