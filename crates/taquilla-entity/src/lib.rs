//! # taquilla-entity
//!
//! Domain entity models for the Veneventos taquilla engine. Every struct in
//! this crate represents a database table row or a domain value object. All
//! entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and
//! database entities additionally derive `sqlx::FromRow`.

pub mod lock;
pub mod sale;
