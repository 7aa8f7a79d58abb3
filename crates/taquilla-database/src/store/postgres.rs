//! Postgres lock store.
//!
//! Every primitive is a single SQL statement, so indivisibility comes from
//! Postgres row locking and the `seat_locks_tuple_unique` constraint rather
//! than from anything this process does. The original system obtained the
//! same guarantee from database-side stored procedures; the statements here
//! are that contract made explicit.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use taquilla_core::error::{AppError, ErrorKind};
use taquilla_core::result::AppResult;
use taquilla_entity::lock::SeatLock;

use super::{ConflictKind, LockRequest, TryLockOutcome, UnlockOutcome, generate_locator};

/// The compare-and-set. The `DO UPDATE .. WHERE` arm encodes exactly which
/// existing rows may be replaced: expired rows (any status), and same-session
/// rows moving along an allowed transition. Everything else loses the CAS
/// and returns no row.
const TRY_LOCK_SQL: &str = "\
    INSERT INTO seat_locks \
        (seat_id, funcion_id, lock_type, status, session_id, user_id, locator, locked_at, expires_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), $8) \
    ON CONFLICT ON CONSTRAINT seat_locks_tuple_unique DO UPDATE SET \
        status     = EXCLUDED.status, \
        session_id = EXCLUDED.session_id, \
        user_id    = COALESCE(EXCLUDED.user_id, seat_locks.user_id), \
        locator    = CASE WHEN seat_locks.session_id = EXCLUDED.session_id \
                          THEN COALESCE(seat_locks.locator, EXCLUDED.locator) \
                          ELSE EXCLUDED.locator END, \
        locked_at  = EXCLUDED.locked_at, \
        expires_at = EXCLUDED.expires_at \
    WHERE (seat_locks.expires_at IS NOT NULL AND seat_locks.expires_at <= NOW()) \
       OR (seat_locks.session_id = EXCLUDED.session_id \
           AND (seat_locks.status = 'seleccionado' \
                OR (seat_locks.status = 'reservado' \
                    AND EXCLUDED.status IN ('reservado', 'pagado', 'vendido')))) \
    RETURNING *, (xmax = 0) AS inserted";

const UNLOCK_SQL: &str = "\
    DELETE FROM seat_locks \
    WHERE seat_id = $1 AND funcion_id = $2 AND lock_type = 'seat' AND session_id = $3 \
      AND ($4 \
           OR status NOT IN ('reservado', 'pagado', 'vendido', 'bloqueado', 'locked') \
           OR (expires_at IS NOT NULL AND expires_at <= NOW())) \
    RETURNING *";

const IS_AVAILABLE_SQL: &str = "\
    SELECT NOT EXISTS ( \
        SELECT 1 FROM seat_locks \
        WHERE seat_id = $1 AND funcion_id = $2 AND lock_type = 'seat' \
          AND (expires_at IS NULL OR expires_at > NOW()) \
          AND ($3::uuid IS NULL OR session_id <> $3) \
    )";

const GET_STATUS_SQL: &str = "\
    SELECT * FROM seat_locks \
    WHERE seat_id = $1 AND funcion_id = $2 AND lock_type = 'seat'";

const REAP_SQL: &str = "\
    DELETE FROM seat_locks \
    WHERE expires_at IS NOT NULL AND expires_at <= NOW() \
      AND status NOT IN ('reservado', 'pagado', 'vendido', 'bloqueado', 'locked')";

/// Row returned by the CAS, with the insert/update discriminator.
#[derive(sqlx::FromRow)]
struct CasRow {
    #[sqlx(flatten)]
    lock: SeatLock,
    /// `xmax = 0` holds only for freshly inserted tuples.
    inserted: bool,
}

/// Postgres-backed [`super::LockStore`].
#[derive(Debug, Clone)]
pub struct PgLockStore {
    pool: PgPool,
}

impl PgLockStore {
    /// Create a new Postgres lock store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn expires_at(req: &LockRequest) -> Option<DateTime<Utc>> {
        req.ttl
            .map(|ttl| Utc::now() + Duration::seconds(ttl.as_secs() as i64))
    }
}

#[async_trait]
impl super::LockStore for PgLockStore {
    /// Note: a takeover of an expired row reports `Renewed` (the tuple was
    /// updated, not inserted) even though this session held nothing before.
    /// Callers treat both success arms identically; the distinction is
    /// informational.
    async fn try_lock(&self, req: &LockRequest) -> AppResult<TryLockOutcome> {
        // Two passes: if the conflicting row is reaped between the CAS and
        // the classifying re-read, the second pass wins cleanly.
        for _ in 0..2 {
            let row = sqlx::query_as::<_, CasRow>(TRY_LOCK_SQL)
                .bind(&req.seat_id)
                .bind(req.funcion_id)
                .bind(req.lock_type)
                .bind(req.status)
                .bind(req.session_id)
                .bind(req.user_id)
                .bind(generate_locator())
                .bind(Self::expires_at(req))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to acquire seat lock", e)
                })?;

            if let Some(row) = row {
                return Ok(if row.inserted {
                    TryLockOutcome::Acquired(row.lock)
                } else {
                    TryLockOutcome::Renewed(row.lock)
                });
            }

            // CAS lost. Re-read and classify the winner; this is the
            // "verify then decide" branch of the protocol, not an error
            // path.
            let now = Utc::now();
            match self.get_status(&req.seat_id, req.funcion_id).await? {
                None => continue,
                Some(existing) if existing.is_expired(now) => continue,
                Some(existing) => {
                    let kind = if existing.is_permanently_held(now) {
                        ConflictKind::Permanent
                    } else if existing.is_owned_by(req.session_id) {
                        // A racing call from the same session renewed the
                        // row already.
                        return Ok(TryLockOutcome::Renewed(existing));
                    } else {
                        ConflictKind::OwnedByOther
                    };
                    return Ok(TryLockOutcome::Conflict { existing, kind });
                }
            }
        }

        Err(AppError::conflict(format!(
            "Lock for seat '{}' funcion {} kept changing during acquisition",
            req.seat_id, req.funcion_id
        )))
    }

    async fn unlock(
        &self,
        seat_id: &str,
        funcion_id: i32,
        session_id: Uuid,
        override_permanent: bool,
    ) -> AppResult<UnlockOutcome> {
        let deleted = sqlx::query_as::<_, SeatLock>(UNLOCK_SQL)
            .bind(seat_id)
            .bind(funcion_id)
            .bind(session_id)
            .bind(override_permanent)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to release seat lock", e)
            })?;

        if let Some(lock) = deleted {
            return Ok(UnlockOutcome::Released(lock));
        }

        match self.get_status(seat_id, funcion_id).await? {
            None => Ok(UnlockOutcome::NotHeld),
            Some(existing) if !existing.is_owned_by(session_id) => {
                Ok(UnlockOutcome::NotOwner(existing))
            }
            Some(existing) => Ok(UnlockOutcome::Permanent(existing)),
        }
    }

    async fn is_available(
        &self,
        seat_id: &str,
        funcion_id: i32,
        excluding_session: Option<Uuid>,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(IS_AVAILABLE_SQL)
            .bind(seat_id)
            .bind(funcion_id)
            .bind(excluding_session)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check seat availability", e)
            })
    }

    async fn get_status(&self, seat_id: &str, funcion_id: i32) -> AppResult<Option<SeatLock>> {
        sqlx::query_as::<_, SeatLock>(GET_STATUS_SQL)
            .bind(seat_id)
            .bind(funcion_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read seat lock", e)
            })
    }

    async fn reap_expired(&self) -> AppResult<u64> {
        let result = sqlx::query(REAP_SQL).execute(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reap expired locks", e)
        })?;

        Ok(result.rows_affected())
    }
}
