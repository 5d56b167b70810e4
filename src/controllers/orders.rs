use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::models::{OrderId, ScreeningId};
use crate::AppState;

use super::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_reservation))
        .route("/orders/{id}", put(update_reservation).get(get_order))
        .route("/orders/{id}/confirm", put(confirm_order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationRequest {
    screening_id: ScreeningId,
    seat_numbers: Vec<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReservationRequest {
    seat_numbers: Vec<u32>,
}

// POST /api/orders
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let seat_numbers: BTreeSet<u32> = req.seat_numbers.into_iter().collect();
    let order = state.reservations.create_hold(req.screening_id, seat_numbers)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Seats reserved successfully.",
            "data": {
                "orderId": order.id,
                "screeningId": order.screening_id,
                "seatNumbers": order.seat_numbers,
                "expiresAt": order.expires_at,
            },
        })),
    ))
}

// PUT /api/orders/{id} — replaces the reservation's seat set; an empty
// list cancels the reservation outright.
async fn update_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let seat_numbers: BTreeSet<u32> = req.seat_numbers.into_iter().collect();
    let order = state.reservations.update_hold(id, seat_numbers)?;

    Ok(Json(json!({
        "success": true,
        "message": "Reservation updated successfully.",
        "data": order,
    })))
}

// GET /api/orders/{id}
async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.reservations.get_order(id)?;
    Ok(Json(json!({ "success": true, "data": order })))
}

// PUT /api/orders/{id}/confirm
async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.reservations.confirm(id)?;
    Ok(Json(json!({
        "success": true,
        "message": "Order confirmed successfully",
        "data": order,
    })))
}
