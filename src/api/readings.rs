use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    api::error::ApiError,
    domain::{NewReading, Reading},
    state::AppState,
};

/// GET /energy/
pub async fn list_readings(State(state): State<AppState>) -> Result<Json<Vec<Reading>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// GET /energy/:id/
pub async fn get_reading(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Reading>, ApiError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("reading {id}")))
}

/// POST /create_energy/
pub async fn create_reading(
    State(state): State<AppState>,
    Json(payload): Json<NewReading>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    payload.validate()?;
    let reading = state.store.insert(payload).await?;
    tracing::info!(id = reading.id, kind = %reading.kind, quantity = reading.quantity, "reading stored");
    Ok((StatusCode::CREATED, Json(reading)))
}
