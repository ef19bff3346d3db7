use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use boxoffice_core::{Booking, BookingIntent, Reservation};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct IntentRequest {
    user_id: i64,
    event_id: i64,
    seat_id: i64,
}

impl From<IntentRequest> for BookingIntent {
    fn from(req: IntentRequest) -> Self {
        BookingIntent {
            user_id: req.user_id,
            event_id: req.event_id,
            seat_id: req.seat_id,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations", post(reserve_seat))
        .route("/v1/reservations/abort", post(abort_reservation))
        .route("/v1/bookings/commit", post(commit_booking))
}

async fn reserve_seat(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.coordinator.reserve(req.into()).await?;
    Ok(Json(reservation))
}

async fn commit_booking(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.coordinator.finalize(req.into()).await?;
    info!("booking {} confirmed", booking.id);
    Ok(Json(booking))
}

async fn abort_reservation(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.coordinator.abort(req.into()).await?;
    Ok(Json(serde_json::json!({ "status": "aborted" })))
}
