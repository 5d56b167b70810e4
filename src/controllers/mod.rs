pub mod error;
pub mod orders;
pub mod screenings;
pub mod ws;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(screenings::routes())
        .merge(orders::routes())
        .merge(ws::routes())
}
