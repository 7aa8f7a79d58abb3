//! Integration tests for the atomic lock coordinator over the in-memory
//! store.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use taquilla_core::config::locks::{LockConfig, RateLimitConfig};
use taquilla_core::error::LockError;
use taquilla_database::store::{LockRequest, LockStore, MemoryLockStore};
use taquilla_entity::lock::LockStatus;

use common::{FlakyLockStore, RecordingAudit, coordinator_with, permissive_config};

fn session() -> String {
    Uuid::new_v4().to_string()
}

#[tokio::test]
async fn test_mutual_exclusion_under_concurrent_lock_calls() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = Arc::clone(&coordinator);
        let session = session();
        handles.push(tokio::spawn(async move {
            coordinator
                .lock("A1", 42, &session, LockStatus::Seleccionado)
                .await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(_) => winners += 1,
            Err(LockError::SeatTaken) => losers += 1,
            Err(other) => panic!("loser must get a definitive SeatTaken, got {other:?}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(losers, 7);
}

#[tokio::test]
async fn test_idempotent_relock_returns_same_record_and_renews() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());
    let session = session();

    let first = coordinator
        .lock("A1", 42, &session, LockStatus::Seleccionado)
        .await
        .expect("first lock");
    let second = coordinator
        .lock("A1", 42, &session, LockStatus::Seleccionado)
        .await
        .expect("idempotent re-lock");

    assert_eq!(first.id, second.id);
    assert_eq!(first.locator, second.locator);
    // Renew-on-idempotent-relock: the timer restarts.
    assert!(second.locked_at >= first.locked_at);
    assert!(second.expires_at >= first.expires_at);
}

#[tokio::test]
async fn test_expired_lock_is_reclaimable_by_other_session() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let config = LockConfig {
        selection_ttl_seconds: 0,
        ..permissive_config()
    };
    let coordinator = coordinator_with(store, audit, config);

    let (u1, u2) = (session(), session());
    coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("u1 locks");

    assert!(coordinator.is_available("A1", 42, None).await);

    let taken = coordinator
        .lock("A1", 42, &u2, LockStatus::Seleccionado)
        .await
        .expect("u2 acquires the expired seat");
    assert_eq!(
        taken.session_id.to_string(),
        u2,
        "the expired hold moved to the new session"
    );
}

#[tokio::test]
async fn test_lock_unlock_relock_scenario() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());

    let (u1, u2) = (session(), session());

    let lock = coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("u1 locks A1");
    assert_eq!(lock.status, LockStatus::Seleccionado);

    let second = coordinator
        .lock("A1", 42, &u2, LockStatus::Seleccionado)
        .await;
    assert!(matches!(second, Err(LockError::SeatTaken)));
    // The seat is available *to u1* but not to u2.
    assert!(coordinator.is_available("A1", 42, Some(&u1)).await);
    assert!(!coordinator.is_available("A1", 42, Some(&u2)).await);

    coordinator
        .unlock("A1", 42, &u1, false)
        .await
        .expect("u1 unlocks");
    assert!(coordinator.is_available("A1", 42, None).await);

    coordinator
        .lock("A1", 42, &u2, LockStatus::Seleccionado)
        .await
        .expect("u2 locks after release");
}

#[tokio::test]
async fn test_permanent_lock_refuses_buyer_unlock() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store.clone(), audit, permissive_config());
    let u1 = session();

    coordinator
        .lock("B3", 7, &u1, LockStatus::Seleccionado)
        .await
        .expect("u1 locks");

    // Mark the seat paid out of band.
    let session_uuid: Uuid = u1.parse().expect("uuid");
    store
        .try_lock(&LockRequest::new(
            "B3",
            7,
            session_uuid,
            LockStatus::Pagado,
            None,
        ))
        .await
        .expect("finalize sale");

    let unlock = coordinator.unlock("B3", 7, &u1, false).await;
    assert!(matches!(unlock, Err(LockError::PermanentlyLocked)));

    // A different buyer sees the seat as sold.
    let relock = coordinator
        .lock("B3", 7, &session(), LockStatus::Seleccionado)
        .await;
    assert!(matches!(relock, Err(LockError::AlreadyPaid)));

    // The holder cannot downgrade a finalized sale either.
    let downgrade = coordinator
        .lock("B3", 7, &u1, LockStatus::Seleccionado)
        .await;
    assert!(matches!(downgrade, Err(LockError::AlreadyPaid)));

    // The administrative override path still works.
    coordinator
        .unlock("B3", 7, &u1, true)
        .await
        .expect("override unlock");
    assert!(coordinator.is_available("B3", 7, None).await);
}

#[tokio::test]
async fn test_unlock_by_non_owner_is_rejected() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());

    let (u1, u2) = (session(), session());
    coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("u1 locks");

    let unlock = coordinator.unlock("A1", 42, &u2, false).await;
    assert!(matches!(unlock, Err(LockError::NotOwner)));

    // The lock survives the attempt.
    assert!(!coordinator.is_available("A1", 42, None).await);
}

#[tokio::test]
async fn test_unlock_of_absent_lock_is_idempotent_success() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());

    coordinator
        .unlock("A1", 42, &session(), false)
        .await
        .expect("unlocking nothing is a no-op");
}

#[tokio::test]
async fn test_checkout_transition_and_own_hold_relock() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());
    let u1 = session();

    coordinator
        .lock("C5", 3, &u1, LockStatus::Seleccionado)
        .await
        .expect("browse hold");
    let reserved = coordinator
        .lock("C5", 3, &u1, LockStatus::Reservado)
        .await
        .expect("checkout hold");
    assert_eq!(reserved.status, LockStatus::Reservado);

    // Re-selecting while the checkout hold is active keeps the hold.
    let reselect = coordinator
        .lock("C5", 3, &u1, LockStatus::Seleccionado)
        .await
        .expect("idempotent during checkout");
    assert_eq!(reselect.status, LockStatus::Reservado);

    // A plain unlock cannot break the checkout hold.
    let unlock = coordinator.unlock("C5", 3, &u1, false).await;
    assert!(matches!(unlock, Err(LockError::PermanentlyLocked)));
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_storage() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store.clone(), audit, permissive_config());

    let r = coordinator
        .lock("   ", 42, &session(), LockStatus::Seleccionado)
        .await;
    assert!(matches!(r, Err(LockError::InvalidInput(_))));

    let r = coordinator
        .lock("A1", 0, &session(), LockStatus::Seleccionado)
        .await;
    assert!(matches!(r, Err(LockError::InvalidInput(_))));

    let r = coordinator.lock("A1", 42, "", LockStatus::Seleccionado).await;
    assert!(matches!(r, Err(LockError::InvalidInput(_))));

    assert!(store.is_empty().await, "nothing reached the store");
}

#[tokio::test]
async fn test_legacy_seat_prefix_is_normalized() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());
    let u1 = session();

    let lock = coordinator
        .lock("silla_A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("prefixed id locks");
    assert_eq!(lock.seat_id, "A1");

    // Both spellings address the same lock.
    assert!(!coordinator.is_available("A1", 42, None).await);
    coordinator
        .unlock("A1", 42, &u1, false)
        .await
        .expect("unprefixed unlock");
}

#[tokio::test]
async fn test_rate_limit_sheds_hammering_caller() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let config = LockConfig {
        rate_limit: RateLimitConfig {
            max_tokens: 2,
            refill_per_second: 0.0,
        },
        ..permissive_config()
    };
    let coordinator = coordinator_with(store, audit, config);
    let u1 = session();

    coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("first");
    coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("second");
    let third = coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await;
    assert!(matches!(third, Err(LockError::RateLimited)));
}

#[tokio::test]
async fn test_availability_fails_closed_on_store_error() {
    let store = Arc::new(FlakyLockStore::failing_availability());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit, permissive_config());

    assert!(!coordinator.is_available("A1", 42, None).await);
}

#[tokio::test]
async fn test_cleanup_is_gated_between_sweeps() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let config = LockConfig {
        selection_ttl_seconds: 0,
        cleanup_min_interval_seconds: 3600,
        ..permissive_config()
    };
    let coordinator = coordinator_with(store.clone(), audit, config);

    coordinator
        .lock("A1", 42, &session(), LockStatus::Seleccionado)
        .await
        .expect("expired immediately");
    assert_eq!(coordinator.cleanup_expired().await.cleaned, 1);

    coordinator
        .lock("A2", 42, &session(), LockStatus::Seleccionado)
        .await
        .expect("expired immediately");
    // Second sweep arrives inside the minimum interval and is shed.
    assert_eq!(coordinator.cleanup_expired().await.cleaned, 0);
    assert_eq!(store.len().await, 1, "the shed sweep deleted nothing");
}

#[tokio::test]
async fn test_lock_and_unlock_emit_audit_events() {
    let store = Arc::new(MemoryLockStore::new());
    let audit = Arc::new(RecordingAudit::new());
    let coordinator = coordinator_with(store, audit.clone(), permissive_config());
    let u1 = session();

    coordinator
        .lock("A1", 42, &u1, LockStatus::Seleccionado)
        .await
        .expect("lock");
    coordinator
        .unlock("A1", 42, &u1, false)
        .await
        .expect("unlock");

    // Events are fire-and-forget; give the spawned tasks a beat.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let names = audit.event_names().await;
    assert!(names.contains(&"seat_locked"));
    assert!(names.contains(&"seat_unlocked"));
}
