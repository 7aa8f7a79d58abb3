//! # taquilla-engine
//!
//! The seat-reservation concurrency engine: session identity normalization,
//! the atomic lock coordinator, per-caller rate limiting, and the
//! compensating-transaction coordinator that unwinds partial purchases.
//!
//! The engine is stateless across instances; the only serialization point
//! is the lock store's compare-and-set.

pub mod audit;
pub mod coordinator;
pub mod identity;
pub mod rate_limit;
pub mod rollback;

pub use coordinator::{AtomicLockCoordinator, CleanupReport};
pub use rollback::{RollbackCoordinator, TransactionOutcome};
