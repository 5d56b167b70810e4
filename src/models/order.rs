use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::screening::ScreeningId;

pub type OrderId = Uuid;

/// One-way order lifecycle: Pending -> Confirmed or Pending -> Expired.
/// Terminal orders are never deleted; the status is the disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// A reservation tying a set of seats to a lifecycle status and lease.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub screening_id: ScreeningId,
    pub seat_numbers: BTreeSet<u32>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Lease deadline; meaningful only while the order is Pending.
    pub expires_at: DateTime<Utc>,
}

impl Order {
    pub fn is_lease_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
