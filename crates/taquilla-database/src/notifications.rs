//! Payment notification repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use taquilla_core::error::{AppError, ErrorKind};
use taquilla_core::result::AppResult;
use taquilla_core::traits::NotificationChannel;

/// Repository over the `payment_notifications` table.
#[derive(Debug, Clone)]
pub struct PaymentNotificationRepository {
    pool: PgPool,
}

impl PaymentNotificationRepository {
    /// Create a new payment notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationChannel for PaymentNotificationRepository {
    /// Cancel a pending notification. Best-effort and idempotent.
    async fn cancel(&self, notification_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE payment_notifications \
             SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status <> 'cancelled'",
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to cancel notification", e)
        })?;

        Ok(())
    }
}
