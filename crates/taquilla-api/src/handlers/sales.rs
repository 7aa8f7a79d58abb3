//! Sale rollback handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use taquilla_core::error::LockError;
use taquilla_engine::identity;
use taquilla_entity::sale::{RollbackContext, SaleRollbackReport};

use crate::dto::{ApiResponse, RollbackSaleBody};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/sales/rollback
pub async fn rollback_sale(
    State(state): State<AppState>,
    Json(body): Json<RollbackSaleBody>,
) -> Result<Json<ApiResponse<SaleRollbackReport>>, ApiError> {
    let session_id = identity::normalize_session_id(&body.context.session_id)
        .ok_or_else(|| LockError::InvalidInput("session_id must not be empty".into()))?;

    let context = RollbackContext {
        session_id,
        funcion_id: body.context.funcion_id,
        user_id: body.context.user_id,
        reason: body.context.reason,
        requested_at: Utc::now(),
    };

    let report = state.rollback.rollback_complete_sale(&body.sale, &context).await;

    Ok(Json(ApiResponse::ok(report)))
}
