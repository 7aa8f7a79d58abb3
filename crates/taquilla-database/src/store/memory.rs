//! In-memory lock store for single-node deployments and tests.
//!
//! The `tokio::sync::Mutex` around the lock table plays the role Postgres
//! row locking plays in [`super::PgLockStore`]: every primitive runs to
//! completion while holding it, so the semantics match the SQL statements
//! branch for branch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use taquilla_core::result::AppResult;
use taquilla_entity::lock::{LockType, SeatLock};

use super::{ConflictKind, LockRequest, LockStore, TryLockOutcome, UnlockOutcome, generate_locator};

type LockKey = (String, i32, LockType);

/// In-memory [`LockStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    locks: Arc<Mutex<HashMap<LockKey, SeatLock>>>,
}

impl MemoryLockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether the store holds no rows at all.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn try_lock(&self, req: &LockRequest) -> AppResult<TryLockOutcome> {
        let mut locks = self.locks.lock().await;
        let now = Utc::now();
        let key = (req.seat_id.clone(), req.funcion_id, req.lock_type);
        let expires_at = req
            .ttl
            .map(|ttl| now + Duration::seconds(ttl.as_secs() as i64));

        if let Some(existing) = locks.get(&key) {
            if existing.is_active(now) {
                if existing.is_owned_by(req.session_id) {
                    if !existing.status.allows_transition_to(req.status) {
                        return Ok(TryLockOutcome::Conflict {
                            existing: existing.clone(),
                            kind: ConflictKind::Permanent,
                        });
                    }
                    let mut renewed = existing.clone();
                    renewed.status = req.status;
                    renewed.user_id = req.user_id.or(existing.user_id);
                    renewed.locked_at = now;
                    renewed.expires_at = expires_at;
                    locks.insert(key, renewed.clone());
                    debug!(seat_id = %renewed.seat_id, status = %renewed.status, "Lock renewed");
                    return Ok(TryLockOutcome::Renewed(renewed));
                }

                let kind = if existing.is_permanently_held(now) {
                    ConflictKind::Permanent
                } else {
                    ConflictKind::OwnedByOther
                };
                return Ok(TryLockOutcome::Conflict {
                    existing: existing.clone(),
                    kind,
                });
            }
            // Expired row of any status: replaceable.
        }

        let lock = SeatLock {
            id: Uuid::new_v4(),
            seat_id: req.seat_id.clone(),
            funcion_id: req.funcion_id,
            lock_type: req.lock_type,
            status: req.status,
            session_id: req.session_id,
            user_id: req.user_id,
            locator: Some(generate_locator()),
            locked_at: now,
            expires_at,
        };
        locks.insert(key, lock.clone());
        debug!(seat_id = %lock.seat_id, funcion_id = lock.funcion_id, "Lock acquired");
        Ok(TryLockOutcome::Acquired(lock))
    }

    async fn unlock(
        &self,
        seat_id: &str,
        funcion_id: i32,
        session_id: Uuid,
        override_permanent: bool,
    ) -> AppResult<UnlockOutcome> {
        let mut locks = self.locks.lock().await;
        let now = Utc::now();
        let key = (seat_id.to_string(), funcion_id, LockType::Seat);

        match locks.get(&key) {
            None => Ok(UnlockOutcome::NotHeld),
            Some(existing) if !existing.is_owned_by(session_id) => {
                Ok(UnlockOutcome::NotOwner(existing.clone()))
            }
            Some(existing) if existing.is_permanently_held(now) && !override_permanent => {
                Ok(UnlockOutcome::Permanent(existing.clone()))
            }
            Some(_) => {
                let released = locks.remove(&key).expect("entry checked above");
                debug!(seat_id = %released.seat_id, "Lock released");
                Ok(UnlockOutcome::Released(released))
            }
        }
    }

    async fn is_available(
        &self,
        seat_id: &str,
        funcion_id: i32,
        excluding_session: Option<Uuid>,
    ) -> AppResult<bool> {
        let locks = self.locks.lock().await;
        let now = Utc::now();
        let key = (seat_id.to_string(), funcion_id, LockType::Seat);

        Ok(match locks.get(&key) {
            None => true,
            Some(existing) if existing.is_expired(now) => true,
            Some(existing) => excluding_session.is_some_and(|s| existing.is_owned_by(s)),
        })
    }

    async fn get_status(&self, seat_id: &str, funcion_id: i32) -> AppResult<Option<SeatLock>> {
        let locks = self.locks.lock().await;
        let key = (seat_id.to_string(), funcion_id, LockType::Seat);
        Ok(locks.get(&key).cloned())
    }

    async fn reap_expired(&self) -> AppResult<u64> {
        let mut locks = self.locks.lock().await;
        let now = Utc::now();
        let before = locks.len();

        locks.retain(|_, lock| !(lock.is_expired(now) && !lock.status.is_permanent()));

        let reaped = (before - locks.len()) as u64;
        if reaped > 0 {
            warn!(reaped, "Reclaimed expired seat locks");
        }
        Ok(reaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use taquilla_entity::lock::LockStatus;

    fn req(seat: &str, session: Uuid, status: LockStatus, ttl_secs: u64) -> LockRequest {
        LockRequest::new(
            seat,
            1,
            session,
            status,
            Some(StdDuration::from_secs(ttl_secs)),
        )
    }

    #[tokio::test]
    async fn test_first_writer_wins() {
        let store = MemoryLockStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store
            .try_lock(&req("A1", a, LockStatus::Seleccionado, 60))
            .await
            .expect("store");
        assert!(matches!(first, TryLockOutcome::Acquired(_)));

        let second = store
            .try_lock(&req("A1", b, LockStatus::Seleccionado, 60))
            .await
            .expect("store");
        match second {
            TryLockOutcome::Conflict { existing, kind } => {
                assert_eq!(kind, ConflictKind::OwnedByOther);
                assert_eq!(existing.session_id, a);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_same_session_renews_and_keeps_locator() {
        let store = MemoryLockStore::new();
        let session = Uuid::new_v4();

        let first = store
            .try_lock(&req("A1", session, LockStatus::Seleccionado, 60))
            .await
            .expect("store");
        let original = first.record().expect("record").clone();

        let second = store
            .try_lock(&req("A1", session, LockStatus::Reservado, 900))
            .await
            .expect("store");
        match second {
            TryLockOutcome::Renewed(lock) => {
                assert_eq!(lock.id, original.id);
                assert_eq!(lock.locator, original.locator);
                assert_eq!(lock.status, LockStatus::Reservado);
            }
            other => panic!("expected renewal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_lock_is_replaceable() {
        let store = MemoryLockStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .try_lock(&req("A1", a, LockStatus::Seleccionado, 0))
            .await
            .expect("store");
        assert!(store.is_available("A1", 1, None).await.expect("store"));

        let takeover = store
            .try_lock(&req("A1", b, LockStatus::Seleccionado, 60))
            .await
            .expect("store");
        let lock = takeover.record().expect("takeover succeeds");
        assert_eq!(lock.session_id, b);
    }

    #[tokio::test]
    async fn test_terminal_row_never_mutates() {
        let store = MemoryLockStore::new();
        let session = Uuid::new_v4();

        store
            .try_lock(&LockRequest::new("B3", 7, session, LockStatus::Pagado, None))
            .await
            .expect("store");

        let again = store
            .try_lock(&req("B3", session, LockStatus::Seleccionado, 60))
            .await
            .expect("store");
        assert!(matches!(
            again,
            TryLockOutcome::Conflict {
                kind: ConflictKind::Permanent,
                ..
            }
        ));

        let unlock = store.unlock("B3", 7, session, false).await.expect("store");
        assert!(matches!(unlock, UnlockOutcome::Permanent(_)));

        let overridden = store.unlock("B3", 7, session, true).await.expect("store");
        assert!(matches!(overridden, UnlockOutcome::Released(_)));
    }

    #[tokio::test]
    async fn test_reaper_skips_permanent_statuses() {
        let store = MemoryLockStore::new();
        let session = Uuid::new_v4();

        store
            .try_lock(&req("A1", session, LockStatus::Seleccionado, 0))
            .await
            .expect("store");
        store
            .try_lock(&req("A2", session, LockStatus::Reservado, 0))
            .await
            .expect("store");

        let reaped = store.reap_expired().await.expect("store");
        assert_eq!(reaped, 1);

        // The expired checkout hold stays on disk but reads as free.
        assert!(store.get_status("A2", 1).await.expect("store").is_some());
        assert!(store.is_available("A2", 1, None).await.expect("store"));
    }
}
