//! The atomic lock coordinator: the service-level locking API.
//!
//! Validates input, applies rate limiting, delegates to the lock store's
//! atomic primitives, and interprets conflict outcomes — distinguishing
//! "already mine" from "taken by someone else" from "permanently locked".
//! The coordinator is stateless with respect to locks and safe to run on
//! any number of instances; the store's CAS is the only serialization
//! point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use taquilla_core::config::locks::LockConfig;
use taquilla_core::error::LockError;
use taquilla_core::events::LockEvent;
use taquilla_core::result::AppResult;
use taquilla_core::traits::AuditSink;
use taquilla_database::store::{ConflictKind, LockRequest, LockStore, TryLockOutcome, UnlockOutcome};
use taquilla_entity::lock::{LockStatus, SeatLock};

use crate::identity;
use crate::rate_limit::RateLimiter;

/// Result of an expired-lock sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Number of locks reclaimed.
    pub cleaned: u64,
}

/// Service-level seat locking API.
pub struct AtomicLockCoordinator {
    store: Arc<dyn LockStore>,
    audit: Arc<dyn AuditSink>,
    limiter: RateLimiter,
    /// Last sweep instant; sweeps arriving faster than the configured
    /// minimum interval are shed so many clients cannot stampede the store.
    cleanup_gate: Mutex<Option<Instant>>,
    config: LockConfig,
}

impl std::fmt::Debug for AtomicLockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicLockCoordinator").finish()
    }
}

impl AtomicLockCoordinator {
    /// Creates a new coordinator over the given store and audit sink.
    pub fn new(store: Arc<dyn LockStore>, audit: Arc<dyn AuditSink>, config: LockConfig) -> Self {
        let limiter = RateLimiter::from_config(&config.rate_limit);
        Self {
            store,
            audit,
            limiter,
            cleanup_gate: Mutex::new(None),
            config,
        }
    }

    /// TTL applied to a lock acquired with the given status.
    fn ttl_for(&self, status: LockStatus) -> Option<Duration> {
        match status {
            LockStatus::Seleccionado => {
                Some(Duration::from_secs(self.config.selection_ttl_seconds))
            }
            LockStatus::Reservado => Some(Duration::from_secs(self.config.checkout_ttl_seconds)),
            _ => None,
        }
    }

    /// Acquire (or idempotently re-acquire) a seat lock.
    ///
    /// Exactly one of any set of concurrent callers with distinct sessions
    /// wins; every loser receives a definitive [`LockError::SeatTaken`],
    /// never an ambiguous error, so the UI can immediately offer an
    /// alternative seat.
    pub async fn lock(
        &self,
        seat_id: &str,
        funcion_id: i32,
        session_id: &str,
        status: LockStatus,
    ) -> Result<SeatLock, LockError> {
        let seat = identity::normalize_seat_str(seat_id)
            .ok_or_else(|| LockError::InvalidInput("seat_id must be a non-empty string".into()))?;
        if funcion_id < 1 {
            return Err(LockError::InvalidInput(
                "funcion_id must be a positive integer".into(),
            ));
        }
        let session = identity::normalize_session_id(session_id)
            .ok_or_else(|| LockError::InvalidInput("session_id must not be empty".into()))?;

        if !self
            .limiter
            .check(&format!("lock:{session}:{seat}:{funcion_id}"))
            .await
        {
            return Err(LockError::RateLimited);
        }

        // Fast-fail without attempting the CAS when the seat is already
        // permanently held by someone else.
        if let Some(existing) = self.store.get_status(&seat, funcion_id).await? {
            if existing.is_permanently_held(Utc::now()) && !existing.is_owned_by(session) {
                return Err(permanent_error(&existing));
            }
        }

        let req = LockRequest::new(seat.clone(), funcion_id, session, status, self.ttl_for(status));

        // One internal retry when the conflicting lock turns out to be
        // expired or already reaped; a second loss is a definitive answer.
        let mut attempts = 0u8;
        loop {
            attempts += 1;
            match self.store.try_lock(&req).await? {
                TryLockOutcome::Acquired(lock) | TryLockOutcome::Renewed(lock) => {
                    debug!(
                        seat_id = %lock.seat_id,
                        funcion_id = lock.funcion_id,
                        session_id = %session,
                        status = %lock.status,
                        "Seat locked"
                    );
                    self.emit(LockEvent::SeatLocked {
                        seat_id: lock.seat_id.clone(),
                        funcion_id: lock.funcion_id,
                        session_id: session,
                        status: lock.status.to_string(),
                    });
                    return Ok(lock);
                }
                TryLockOutcome::Conflict { existing, kind } => match kind {
                    ConflictKind::Permanent if existing.is_owned_by(session) => {
                        if existing.status.is_terminal_sale() {
                            return Err(LockError::AlreadyPaid);
                        }
                        if existing.status.is_administrative() {
                            return Err(LockError::PermanentlyLocked);
                        }
                        // Re-selecting a seat that sits in this session's
                        // own checkout hold: keep the hold, report success.
                        return Ok(existing);
                    }
                    ConflictKind::Permanent => return Err(permanent_error(&existing)),
                    ConflictKind::OwnedByOther => {
                        // Double-check by re-reading: a permanent lock may
                        // have been created by a concurrent writer between
                        // the fast-fail check and the CAS attempt.
                        let now = Utc::now();
                        match self.store.get_status(&seat, funcion_id).await? {
                            None => {
                                if attempts < 2 {
                                    continue;
                                }
                                return Err(LockError::SeatTaken);
                            }
                            Some(current) if current.is_expired(now) => {
                                if attempts < 2 {
                                    continue;
                                }
                                return Err(LockError::SeatTaken);
                            }
                            Some(current) if current.is_owned_by(session) => {
                                return Ok(current);
                            }
                            Some(current) if current.is_permanently_held(now) => {
                                return Err(permanent_error(&current));
                            }
                            Some(_) => return Err(LockError::SeatTaken),
                        }
                    }
                },
            }
        }
    }

    /// Release a seat lock held by the given session.
    ///
    /// Releasing an absent lock succeeds: unlock is idempotent so retries
    /// and rollback re-invocations are harmless.
    pub async fn unlock(
        &self,
        seat_id: &str,
        funcion_id: i32,
        session_id: &str,
        allow_permanent_override: bool,
    ) -> Result<(), LockError> {
        let seat = identity::normalize_seat_str(seat_id)
            .ok_or_else(|| LockError::InvalidInput("seat_id must be a non-empty string".into()))?;
        if funcion_id < 1 {
            return Err(LockError::InvalidInput(
                "funcion_id must be a positive integer".into(),
            ));
        }
        let session = identity::normalize_session_id(session_id)
            .ok_or_else(|| LockError::InvalidInput("session_id must not be empty".into()))?;

        match self
            .store
            .unlock(&seat, funcion_id, session, allow_permanent_override)
            .await?
        {
            UnlockOutcome::Released(lock) => {
                debug!(
                    seat_id = %lock.seat_id,
                    funcion_id = lock.funcion_id,
                    session_id = %session,
                    "Seat unlocked"
                );
                self.emit(LockEvent::SeatUnlocked {
                    seat_id: lock.seat_id,
                    funcion_id: lock.funcion_id,
                    session_id: session,
                    overridden: allow_permanent_override,
                });
                Ok(())
            }
            UnlockOutcome::NotHeld => Ok(()),
            UnlockOutcome::NotOwner(_) => Err(LockError::NotOwner),
            UnlockOutcome::Permanent(_) => Err(LockError::PermanentlyLocked),
        }
    }

    /// Whether the seat can be offered to the given session.
    ///
    /// Never errors: an uncertain seat is not offered as available.
    pub async fn is_available(
        &self,
        seat_id: &str,
        funcion_id: i32,
        excluding_session: Option<&str>,
    ) -> bool {
        let Some(seat) = identity::normalize_seat_str(seat_id) else {
            return false;
        };
        if funcion_id < 1 {
            return false;
        }
        let excluding = excluding_session.and_then(identity::normalize_session_id);

        match self.store.is_available(&seat, funcion_id, excluding).await {
            Ok(available) => available,
            Err(e) => {
                warn!(
                    seat_id = %seat,
                    funcion_id,
                    error = %e,
                    "Availability check failed; reporting seat as unavailable"
                );
                false
            }
        }
    }

    /// The current lock row for the seat, if any. Invalid identifiers read
    /// as "no lock" rather than raising, matching the read-only contract.
    pub async fn get_status(&self, seat_id: &str, funcion_id: i32) -> AppResult<Option<SeatLock>> {
        let Some(seat) = identity::normalize_seat_str(seat_id) else {
            warn!(seat_id, "Ignoring status query with invalid seat_id");
            return Ok(None);
        };
        if funcion_id < 1 {
            return Ok(None);
        }
        self.store.get_status(&seat, funcion_id).await
    }

    /// Sweep expired locks. Best-effort maintenance: failures and shed
    /// sweeps both report zero instead of raising.
    pub async fn cleanup_expired(&self) -> CleanupReport {
        {
            let mut gate = self.cleanup_gate.lock().await;
            let min_interval = Duration::from_secs(self.config.cleanup_min_interval_seconds);
            if let Some(last) = *gate {
                if last.elapsed() < min_interval {
                    debug!("Expired-lock sweep shed (ran too recently)");
                    return CleanupReport { cleaned: 0 };
                }
            }
            *gate = Some(Instant::now());
        }

        match self.store.reap_expired().await {
            Ok(cleaned) => {
                if cleaned > 0 {
                    info!(cleaned, "Reclaimed expired seat locks");
                    self.emit(LockEvent::LocksReaped { count: cleaned });
                }
                CleanupReport { cleaned }
            }
            Err(e) => {
                warn!(error = %e, "Expired-lock sweep failed");
                CleanupReport { cleaned: 0 }
            }
        }
    }

    /// Emit a domain event to the audit collaborator without blocking the
    /// calling operation.
    fn emit(&self, event: LockEvent) {
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            sink.record(event).await;
        });
    }
}

/// Map a permanently-held lock to the buyer-facing error.
fn permanent_error(existing: &SeatLock) -> LockError {
    if existing.status.is_terminal_sale() {
        LockError::AlreadyPaid
    } else {
        LockError::PermanentlyLocked
    }
}
