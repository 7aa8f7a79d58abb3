//! Seat-lock handlers.

use axum::Json;
use axum::extract::{Query, State};

use taquilla_core::error::LockError;
use taquilla_engine::CleanupReport;
use taquilla_engine::identity;
use taquilla_entity::lock::{LockStatus, SeatLock};

use crate::dto::{
    ApiResponse, AvailabilityQuery, AvailabilityResponse, LockRequestBody, StatusQuery,
    UnlockRequestBody, UnlockResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/locks
pub async fn lock(
    State(state): State<AppState>,
    Json(body): Json<LockRequestBody>,
) -> Result<Json<ApiResponse<SeatLock>>, ApiError> {
    let seat_id = identity::normalize_seat_id(&body.seat_id)
        .ok_or_else(|| LockError::InvalidInput("seat_id must be a non-empty string".into()))?;
    let funcion_id = identity::normalize_funcion_id(&body.funcion_id)
        .ok_or_else(|| LockError::InvalidInput("funcion_id must be a positive integer".into()))?;
    let status = body.status.unwrap_or(LockStatus::Seleccionado);

    let lock = state
        .coordinator
        .lock(&seat_id, funcion_id, &body.session_id, status)
        .await?;

    Ok(Json(ApiResponse::ok(lock)))
}

/// DELETE /api/locks
pub async fn unlock(
    State(state): State<AppState>,
    Json(body): Json<UnlockRequestBody>,
) -> Result<Json<ApiResponse<UnlockResponse>>, ApiError> {
    let seat_id = identity::normalize_seat_id(&body.seat_id)
        .ok_or_else(|| LockError::InvalidInput("seat_id must be a non-empty string".into()))?;
    let funcion_id = identity::normalize_funcion_id(&body.funcion_id)
        .ok_or_else(|| LockError::InvalidInput("funcion_id must be a positive integer".into()))?;

    state
        .coordinator
        .unlock(
            &seat_id,
            funcion_id,
            &body.session_id,
            body.allow_permanent_override,
        )
        .await?;

    Ok(Json(ApiResponse::ok(UnlockResponse { released: true })))
}

/// GET /api/locks/availability
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Json<ApiResponse<AvailabilityResponse>> {
    let available = state
        .coordinator
        .is_available(&query.seat_id, query.funcion_id, query.session_id.as_deref())
        .await;

    Json(ApiResponse::ok(AvailabilityResponse { available }))
}

/// GET /api/locks/status
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Option<SeatLock>>>, ApiError> {
    let lock = state
        .coordinator
        .get_status(&query.seat_id, query.funcion_id)
        .await?;

    Ok(Json(ApiResponse::ok(lock)))
}

/// POST /api/locks/cleanup
pub async fn cleanup(State(state): State<AppState>) -> Json<ApiResponse<CleanupReport>> {
    let report = state.coordinator.cleanup_expired().await;
    Json(ApiResponse::ok(report))
}
