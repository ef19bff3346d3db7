use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boxoffice_core::ReservationError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Reservation(ReservationError),
    Anyhow(anyhow::Error),
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        Self::Reservation(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Anyhow(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Reservation(err) => {
                let status = match &err {
                    ReservationError::DuplicateBooking { .. } => StatusCode::CONFLICT,
                    ReservationError::SeatLocked { .. } => StatusCode::CONFLICT,
                    ReservationError::ReservationExpired { .. } => StatusCode::GONE,
                    ReservationError::NotLockHolder { .. } => StatusCode::FORBIDDEN,
                    ReservationError::LockServiceUnavailable(_)
                    | ReservationError::StoreUnavailable(_)
                    | ReservationError::CacheUnavailable(_) => {
                        tracing::error!("infrastructure fault: {}", err);
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                (status, err.to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
