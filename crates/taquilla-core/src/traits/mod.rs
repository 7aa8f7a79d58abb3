//! Trait contracts for external collaborators.

pub mod collaborators;

pub use collaborators::{AuditSink, NotificationChannel, PaymentGateway};
