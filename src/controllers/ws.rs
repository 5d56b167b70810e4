use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;
use tracing::debug;

use crate::models::ScreeningId;
use crate::services::{ReservationError, Subscription};
use crate::AppState;

use super::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/screenings/{id}/live", get(live_updates))
}

// GET /api/screenings/{id}/live — WebSocket push channel for one
// screening. Each seats-changed signal becomes a seats-updated frame; the
// client reacts by re-fetching the seat snapshot. Switching screenings is
// reconnecting on another path.
async fn live_updates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ScreeningId>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if state.ledger.get_screening(id).is_none() {
        return Err(ReservationError::ScreeningNotFound.into());
    }
    // Subscribe before the upgrade completes so no change slips between
    // the client's initial snapshot fetch and its first frame.
    let subscription = state.bus.subscribe(id);
    Ok(ws.on_upgrade(move |socket| stream_updates(socket, subscription)))
}

async fn stream_updates(mut socket: WebSocket, mut subscription: Subscription) {
    let screening_id = subscription.screening_id();
    debug!(%screening_id, "live seat updates client connected");

    loop {
        tokio::select! {
            changed = subscription.recv() => {
                let Some(changed) = changed else { break };
                let frame = json!({
                    "type": "seats-updated",
                    "screeningId": changed.screening_id,
                })
                .to_string();
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by axum; other frames are ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!(%screening_id, "live seat updates client disconnected");
    subscription.unsubscribe();
}
