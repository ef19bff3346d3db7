use axum::{
    extract::{Query, State},
    routing::{delete, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SeedParams {
    #[serde(default = "default_seats")]
    seats: i64,
    #[serde(default = "default_users")]
    users: i64,
}

fn default_seats() -> i64 { 50_000 }
fn default_users() -> i64 { 100_000 }

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/seed", post(seed))
        .route("/v1/admin/truncate", delete(truncate))
}

async fn seed(
    State(state): State<AppState>,
    Query(params): Query<SeedParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let event_id = state.catalog.seed(params.seats, params.users).await?;
    Ok(Json(serde_json::json!({ "status": "success", "event_id": event_id })))
}

async fn truncate(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.catalog.truncate().await?;
    Ok(Json(serde_json::json!({ "status": "success" })))
}
