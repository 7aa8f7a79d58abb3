//! # taquilla-worker
//!
//! Background maintenance tasks. Today that is a single job: the
//! expiration reaper that reclaims abandoned seat locks.

pub mod reaper;

pub use reaper::ExpirationReaper;
