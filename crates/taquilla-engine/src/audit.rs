//! Default audit collaborator backed by structured logging.

use async_trait::async_trait;
use tracing::info;

use taquilla_core::events::LockEvent;
use taquilla_core::traits::AuditSink;

/// Audit sink that records events to the tracing pipeline.
///
/// Used when no dedicated audit service is wired in; a real deployment can
/// swap in any [`AuditSink`] without touching the engine.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Create a new tracing-backed audit sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: LockEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(event = event.name(), payload, "Domain event"),
            Err(e) => info!(event = event.name(), error = %e, "Domain event (unserializable)"),
        }
    }
}
