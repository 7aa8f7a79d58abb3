//! Application state shared across all handlers.

use std::sync::Arc;

use taquilla_core::config::AppConfig;
use taquilla_engine::{AtomicLockCoordinator, RollbackCoordinator};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Seat-lock coordinator.
    pub coordinator: Arc<AtomicLockCoordinator>,
    /// Purchase rollback coordinator.
    pub rollback: Arc<RollbackCoordinator>,
}
