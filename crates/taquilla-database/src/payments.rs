//! Payment transaction repository.
//!
//! The payment gateway proper lives outside this system; the engine only
//! owns the compensation side, marking a transaction record failed when a
//! purchase is unwound.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use taquilla_core::error::{AppError, ErrorKind};
use taquilla_core::result::AppResult;
use taquilla_core::traits::PaymentGateway;

/// Repository over the `payment_transactions` table.
#[derive(Debug, Clone)]
pub struct PaymentTransactionRepository {
    pool: PgPool,
}

impl PaymentTransactionRepository {
    /// Create a new payment transaction repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentGateway for PaymentTransactionRepository {
    /// Mark a transaction failed. Idempotent: an already-failed transaction
    /// is left untouched, and a missing transaction is a no-op (the record
    /// may never have been created before the purchase fell over).
    async fn mark_failed(&self, transaction_id: Uuid, reason: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE payment_transactions \
             SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'failed'",
        )
        .bind(transaction_id)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark transaction failed", e)
        })?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                transaction_id = %transaction_id,
                "Payment transaction already failed or absent"
            );
        }
        Ok(())
    }
}
