//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use taquilla_core::error::{AppError, LockError};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Newtype so the foreign `LockError` can implement `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub LockError);

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        Self(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(LockError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            LockError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            LockError::NotOwner => (StatusCode::FORBIDDEN, "NOT_OWNER"),
            LockError::SeatTaken => (StatusCode::CONFLICT, "SEAT_TAKEN"),
            LockError::AlreadyPaid => (StatusCode::CONFLICT, "ALREADY_PAID"),
            LockError::PermanentlyLocked => (StatusCode::LOCKED, "PERMANENTLY_LOCKED"),
            LockError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            LockError::Store(e) => {
                tracing::error!(error = %e, "Lock store failure surfaced to API");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_outcomes_map_to_client_errors() {
        let cases = [
            (LockError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (LockError::SeatTaken, StatusCode::CONFLICT),
            (LockError::AlreadyPaid, StatusCode::CONFLICT),
            (LockError::PermanentlyLocked, StatusCode::LOCKED),
            (LockError::NotOwner, StatusCode::FORBIDDEN),
            (LockError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
        ];
        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_store_failures_are_internal() {
        let response = ApiError(LockError::Store(AppError::database("down"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
