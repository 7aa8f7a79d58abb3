//! # taquilla-api
//!
//! HTTP surface for the taquilla engine built on Axum. Transport only:
//! DTOs, handlers, and error mapping. Every locking and rollback semantic
//! lives in `taquilla-engine`, so the operations here can equally be
//! exposed over any other transport.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
