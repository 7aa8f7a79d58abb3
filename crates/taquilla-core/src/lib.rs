//! # taquilla-core
//!
//! Core crate for the Veneventos taquilla engine. Contains configuration
//! schemas, domain events, collaborator trait contracts, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other taquilla crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;

pub use error::{AppError, LockError};
pub use result::AppResult;
