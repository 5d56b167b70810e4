use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::{Screening, ScreeningId, Seat, SeatStatus};
use crate::services::ReservationError;
use crate::AppState;

use super::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/screenings", get(list_screenings))
        .route("/screenings/{id}", get(get_screening))
        .route("/screenings/{id}/seats", get(get_occupied_seats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScreeningResponse {
    id: ScreeningId,
    movie_title: String,
    /// Start time formatted HH:MM, matching what the seat map UI shows.
    time: String,
}

impl From<Screening> for ScreeningResponse {
    fn from(s: Screening) -> Self {
        Self {
            id: s.id,
            movie_title: s.movie_title,
            time: s.starts_at.format("%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OccupiedSeatResponse {
    number: u32,
    status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reserved_until: Option<DateTime<Utc>>,
}

impl From<Seat> for OccupiedSeatResponse {
    fn from(seat: Seat) -> Self {
        Self {
            number: seat.number,
            status: seat.status,
            reserved_until: seat.lease_expiry,
        }
    }
}

// GET /api/screenings
async fn list_screenings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut screenings = state.ledger.list_screenings();
    screenings.sort_by_key(|s| s.starts_at);

    let data: Vec<ScreeningResponse> = screenings.into_iter().map(Into::into).collect();
    Json(json!({ "success": true, "data": data }))
}

// GET /api/screenings/{id}
async fn get_screening(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ScreeningId>,
) -> Result<impl IntoResponse, ApiError> {
    let screening = state
        .ledger
        .get_screening(id)
        .ok_or(ReservationError::ScreeningNotFound)?;

    Ok(Json(json!({
        "success": true,
        "data": ScreeningResponse::from(screening),
    })))
}

// GET /api/screenings/{id}/seats — point-in-time snapshot of every
// non-available seat; clients re-fetch this on each seats-updated signal.
async fn get_occupied_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ScreeningId>,
) -> Result<impl IntoResponse, ApiError> {
    let occupied = state.ledger.snapshot_occupied(id)?;
    let data: Vec<OccupiedSeatResponse> = occupied.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "success": true, "data": data })))
}
