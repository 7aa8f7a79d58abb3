//! Route definitions for the taquilla HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(lock_routes())
        .merge(sale_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Seat-lock endpoints: lock, unlock, availability, status, cleanup.
fn lock_routes() -> Router<AppState> {
    Router::new()
        .route("/locks", post(handlers::locks::lock))
        .route("/locks", delete(handlers::locks::unlock))
        .route("/locks/availability", get(handlers::locks::availability))
        .route("/locks/status", get(handlers::locks::status))
        .route("/locks/cleanup", post(handlers::locks::cleanup))
}

/// Sale rollback endpoint.
fn sale_routes() -> Router<AppState> {
    Router::new().route("/sales/rollback", post(handlers::sales::rollback_sale))
}

/// Health endpoint.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
