use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Held,
    Booked,
}

/// A single numbered seat in a screening's seat table.
///
/// `holder` is present iff the seat is Held or Booked; `lease_expiry` is
/// present iff the seat is Held.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub number: u32,
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_expiry: Option<DateTime<Utc>>,
}

impl Seat {
    pub fn available(number: u32) -> Self {
        Self {
            number,
            status: SeatStatus::Available,
            holder: None,
            lease_expiry: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}
