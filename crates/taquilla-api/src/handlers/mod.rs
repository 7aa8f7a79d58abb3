//! Request handlers, grouped by domain.

pub mod health;
pub mod locks;
pub mod sales;
