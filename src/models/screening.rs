use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub type ScreeningId = Uuid;

/// A scheduled showing with a fixed seat pool. Created once at scheduling
/// time; the seat table behind it is mutated only through the ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Screening {
    pub id: ScreeningId,
    pub movie_title: String,
    pub starts_at: DateTime<Utc>,
    pub seat_count: u32,
}
