use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::models::{Order, OrderId, OrderStatus, ScreeningId};

use super::error::ReservationError;
use super::ledger::SeatLedger;
use super::notifications::NotificationBus;

/// Orchestrates the order lifecycle (Pending -> Confirmed/Expired) on top
/// of the seat ledger, and enforces the business rules the ledger does not
/// know about: seat-count bounds, the fixed hold lease, and lease-time
/// expiry (an order past its `expires_at` is treated as expired by every
/// caller-facing path even before the sweeper reclaims it).
///
/// Each order record has its own mutex, held across the ledger mutation,
/// so the record and the seat table are always written in the same order:
/// a Pending order's `seat_numbers` are exactly its held seats at every
/// observable instant. Operations on different orders stay concurrent.
///
/// Orders are never deleted; terminal orders remain readable as audit
/// records.
pub struct ReservationManager {
    ledger: Arc<SeatLedger>,
    bus: Arc<NotificationBus>,
    orders: RwLock<HashMap<OrderId, Arc<Mutex<Order>>>>,
    hold_lease: Duration,
    max_seats_per_order: usize,
}

impl ReservationManager {
    pub fn new(
        ledger: Arc<SeatLedger>,
        bus: Arc<NotificationBus>,
        hold_lease: Duration,
        max_seats_per_order: usize,
    ) -> Self {
        Self {
            ledger,
            bus,
            orders: RwLock::new(HashMap::new()),
            hold_lease,
            max_seats_per_order,
        }
    }

    /// Places a time-boxed hold on the requested seats and records the
    /// resulting Pending order. Fails with `Validation` for an empty or
    /// oversized seat set, `ScreeningNotFound` for an unknown screening,
    /// and `Conflict` (naming the seats) when any requested seat is taken.
    pub fn create_hold(
        &self,
        screening_id: ScreeningId,
        seat_numbers: BTreeSet<u32>,
    ) -> Result<Order, ReservationError> {
        self.create_hold_with_lease(screening_id, seat_numbers, self.hold_lease)
    }

    /// Same as [`create_hold`](Self::create_hold) with an explicit lease
    /// duration, for callers that manage their own deadlines.
    pub fn create_hold_with_lease(
        &self,
        screening_id: ScreeningId,
        seat_numbers: BTreeSet<u32>,
        lease: Duration,
    ) -> Result<Order, ReservationError> {
        self.check_seat_cardinality(&seat_numbers, false)?;

        let (order_id, expires_at) = self.ledger.try_hold(screening_id, &seat_numbers, lease)?;
        let order = Order {
            id: order_id,
            screening_id,
            seat_numbers,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            expires_at,
        };
        self.orders
            .write()
            .insert(order_id, Arc::new(Mutex::new(order.clone())));

        info!(
            order_id = %order_id,
            screening_id = %screening_id,
            seats = ?order.seat_numbers,
            %expires_at,
            "hold created"
        );
        // Publish only after the hold has committed, off the locked path.
        self.bus.publish(screening_id);
        Ok(order)
    }

    /// Replaces a Pending order's seat set. An empty set is the explicit
    /// cancel path: all seats are released and the order becomes Expired
    /// immediately, without waiting for a sweep.
    ///
    /// Lease expiry is checked before the seat diff, so a caller racing the
    /// sweeper sees `Expired`, never a seat `Conflict`.
    pub fn update_hold(
        &self,
        order_id: OrderId,
        seat_numbers: BTreeSet<u32>,
    ) -> Result<Order, ReservationError> {
        self.check_seat_cardinality(&seat_numbers, true)?;

        let entry = self.order_entry(order_id)?;
        let updated = {
            let mut order = entry.lock();
            if order.status != OrderStatus::Pending {
                return Err(ReservationError::InvalidState);
            }
            if order.is_lease_lapsed(Utc::now()) {
                return Err(ReservationError::Expired);
            }

            // The record stays locked across the ledger write: concurrent
            // updates to the same order commit record and seat table in
            // the same order.
            self.ledger
                .update_hold(order.screening_id, order_id, &seat_numbers)?;
            order.seat_numbers = seat_numbers;
            if order.seat_numbers.is_empty() {
                order.status = OrderStatus::Expired;
            }
            order.clone()
        };

        if updated.status == OrderStatus::Expired {
            info!(order_id = %order_id, "hold cancelled by emptying its seat set");
        } else {
            info!(order_id = %order_id, seats = ?updated.seat_numbers, "hold updated");
        }
        self.bus.publish(updated.screening_id);
        Ok(updated)
    }

    /// Confirms a Pending order, making its seats Booked permanently.
    pub fn confirm(&self, order_id: OrderId) -> Result<Order, ReservationError> {
        let entry = self.order_entry(order_id)?;
        let confirmed = {
            let mut order = entry.lock();
            if order.status != OrderStatus::Pending {
                return Err(ReservationError::InvalidState);
            }
            if order.is_lease_lapsed(Utc::now()) {
                return Err(ReservationError::Expired);
            }

            self.ledger.confirm(order.screening_id, order_id)?;
            order.status = OrderStatus::Confirmed;
            order.clone()
        };

        info!(order_id = %order_id, seats = ?confirmed.seat_numbers, "order confirmed");
        self.bus.publish(confirmed.screening_id);
        Ok(confirmed)
    }

    pub fn get_order(&self, order_id: OrderId) -> Result<Order, ReservationError> {
        Ok(self.order_entry(order_id)?.lock().clone())
    }

    /// Pending orders whose lease lapsed before `now`. Returns clones; the
    /// sweeper works off this snapshot.
    pub fn expired_pending(&self, now: DateTime<Utc>) -> Vec<Order> {
        self.orders
            .read()
            .values()
            .filter_map(|entry| {
                let order = entry.lock();
                (order.status == OrderStatus::Pending && order.is_lease_lapsed(now))
                    .then(|| order.clone())
            })
            .collect()
    }

    /// Marks an order Expired. Idempotent: an already-terminal order is
    /// left untouched, so a crashed-and-retried sweep is a no-op.
    pub fn mark_expired(&self, order_id: OrderId) -> Result<Order, ReservationError> {
        let entry = self.order_entry(order_id)?;
        let mut order = entry.lock();
        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::Expired;
        }
        Ok(order.clone())
    }

    fn order_entry(&self, order_id: OrderId) -> Result<Arc<Mutex<Order>>, ReservationError> {
        self.orders
            .read()
            .get(&order_id)
            .cloned()
            .ok_or(ReservationError::OrderNotFound)
    }

    fn check_seat_cardinality(
        &self,
        seat_numbers: &BTreeSet<u32>,
        allow_empty: bool,
    ) -> Result<(), ReservationError> {
        if seat_numbers.is_empty() && !allow_empty {
            return Err(ReservationError::Validation(
                "at least one seat number is required".to_string(),
            ));
        }
        if seat_numbers.len() > self.max_seats_per_order {
            return Err(ReservationError::Validation(format!(
                "cannot reserve more than {} seats at a time",
                self.max_seats_per_order
            )));
        }
        Ok(())
    }
}
