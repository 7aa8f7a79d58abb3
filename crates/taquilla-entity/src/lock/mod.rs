//! Seat-lock entity.

pub mod model;
pub mod status;

pub use model::SeatLock;
pub use status::{LockStatus, LockType};
