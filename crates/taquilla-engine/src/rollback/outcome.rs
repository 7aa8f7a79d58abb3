//! Outcome of a transaction run under compensating rollback.

use taquilla_core::error::AppError;

/// What happened to a transaction executed with rollback protection.
#[derive(Debug)]
pub enum TransactionOutcome<T> {
    /// The action succeeded; its result is returned untouched.
    Committed(T),
    /// The action failed and the compensation completed.
    RolledBack {
        /// The original transaction error.
        error: AppError,
    },
    /// The action failed **and** the compensation failed. The system is in
    /// a state it could not repair on its own; this outcome is escalated to
    /// the monitoring collaborator in addition to being returned.
    CriticalFailure {
        /// The original transaction error.
        error: AppError,
        /// The compensation error.
        rollback_error: AppError,
    },
}

impl<T> TransactionOutcome<T> {
    /// Whether the action committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Whether the compensation ran to completion.
    pub fn rollback_executed(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }

    /// Whether the compensation itself failed.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::CriticalFailure { .. })
    }

    /// The committed value, if any.
    pub fn into_committed(self) -> Option<T> {
        match self {
            Self::Committed(value) => Some(value),
            _ => None,
        }
    }

    /// The original transaction error, if the action failed.
    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Committed(_) => None,
            Self::RolledBack { error } | Self::CriticalFailure { error, .. } => Some(error),
        }
    }
}
