//! Taquilla server — seat-reservation engine for Veneventos.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use taquilla_core::config::AppConfig;
use taquilla_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TAQUILLA_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting taquilla v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = taquilla_database::DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    taquilla_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Lock store and engine ────────────────────────────
    let store = Arc::new(taquilla_database::PgLockStore::new(db.pool().clone()));
    let audit = Arc::new(taquilla_engine::audit::TracingAuditSink::new());

    let coordinator = Arc::new(taquilla_engine::AtomicLockCoordinator::new(
        store,
        audit.clone(),
        config.locks.clone(),
    ));

    let payments = Arc::new(
        taquilla_database::payments::PaymentTransactionRepository::new(db.pool().clone()),
    );
    let notifications = Arc::new(
        taquilla_database::notifications::PaymentNotificationRepository::new(db.pool().clone()),
    );

    let rollback = Arc::new(taquilla_engine::RollbackCoordinator::new(
        Arc::clone(&coordinator),
        payments,
        notifications,
        audit,
    ));

    tracing::info!("Lock engine initialized");

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Start expiration reaper ──────────────────────────
    let reaper_handle = if config.worker.enabled {
        let reaper = taquilla_worker::ExpirationReaper::new(
            Arc::clone(&coordinator),
            config.worker.clone(),
        );
        let reaper_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            reaper.run(reaper_cancel).await;
        });
        tracing::info!("Expiration reaper started");
        Some(handle)
    } else {
        tracing::info!("Expiration reaper disabled");
        None
    };

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = taquilla_api::AppState {
        config: Arc::new(config),
        coordinator,
        rollback,
    };
    let app = taquilla_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Taquilla server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    if let Some(handle) = reaper_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(10), handle).await;
    }

    db.close().await;
    tracing::info!("Taquilla server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
