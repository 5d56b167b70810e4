use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Order, Screening, ScreeningId, Seat, SeatStatus};
use crate::models::order::OrderId;

use super::error::ReservationError;

/// Authoritative per-screening seat state. The only component allowed to
/// mutate seat ownership.
///
/// Every mutation for a given screening happens as one atomic unit under
/// that screening's mutex: availability is checked and the new state is
/// written without releasing the lock in between, so two racing holds for
/// an overlapping seat set can never both succeed. Different screenings
/// use different mutexes and never serialize against each other.
pub struct SeatLedger {
    screenings: RwLock<HashMap<ScreeningId, Arc<ScreeningEntry>>>,
}

struct ScreeningEntry {
    info: Screening,
    /// Seat table, indexed by seat number - 1.
    seats: Mutex<Vec<Seat>>,
}

impl SeatLedger {
    pub fn new() -> Self {
        Self {
            screenings: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new screening with `seat_count` seats, all Available.
    pub fn add_screening(
        &self,
        movie_title: impl Into<String>,
        starts_at: DateTime<Utc>,
        seat_count: u32,
    ) -> Screening {
        let info = Screening {
            id: Uuid::new_v4(),
            movie_title: movie_title.into(),
            starts_at,
            seat_count,
        };
        let seats = (1..=seat_count).map(Seat::available).collect();
        let entry = Arc::new(ScreeningEntry {
            info: info.clone(),
            seats: Mutex::new(seats),
        });
        self.screenings.write().insert(info.id, entry);
        debug!(screening_id = %info.id, seat_count, "registered screening");
        info
    }

    pub fn get_screening(&self, screening_id: ScreeningId) -> Option<Screening> {
        self.screenings
            .read()
            .get(&screening_id)
            .map(|e| e.info.clone())
    }

    pub fn list_screenings(&self) -> Vec<Screening> {
        self.screenings
            .read()
            .values()
            .map(|e| e.info.clone())
            .collect()
    }

    pub fn screening_count(&self) -> usize {
        self.screenings.read().len()
    }

    /// Atomically holds every requested seat under a fresh order token, or
    /// fails with `Conflict` naming every seat that is not Available.
    /// Partial holds are never observable: the check and the write happen
    /// under the same lock acquisition.
    pub fn try_hold(
        &self,
        screening_id: ScreeningId,
        seat_numbers: &BTreeSet<u32>,
        lease: Duration,
    ) -> Result<(OrderId, DateTime<Utc>), ReservationError> {
        let entry = self.entry(screening_id)?;
        check_seat_numbers(seat_numbers, entry.info.seat_count)?;

        let order_id = Uuid::new_v4();
        let expires_at = Utc::now() + lease;

        let mut seats = entry.seats.lock();
        let unavailable: Vec<u32> = seat_numbers
            .iter()
            .copied()
            .filter(|&n| !seats[(n - 1) as usize].is_available())
            .collect();
        if !unavailable.is_empty() {
            return Err(ReservationError::Conflict { seats: unavailable });
        }
        for &n in seat_numbers {
            let seat = &mut seats[(n - 1) as usize];
            seat.status = SeatStatus::Held;
            seat.holder = Some(order_id);
            seat.lease_expiry = Some(expires_at);
        }
        Ok((order_id, expires_at))
    }

    /// Replaces the order's held seat set with `new_seats`, preserving the
    /// original lease expiry. Applies the full add/remove diff or nothing:
    /// fails with `Conflict` if any newly requested seat is occupied by a
    /// different holder, and `InvalidState` if the order holds no seats or
    /// its lease has already lapsed. Seats already held by this order never
    /// conflict with themselves.
    pub fn update_hold(
        &self,
        screening_id: ScreeningId,
        order_id: OrderId,
        new_seats: &BTreeSet<u32>,
    ) -> Result<(), ReservationError> {
        let entry = self.entry(screening_id)?;
        check_seat_numbers(new_seats, entry.info.seat_count)?;

        let now = Utc::now();
        let mut seats = entry.seats.lock();

        let owned: BTreeSet<u32> = seats
            .iter()
            .filter(|s| s.status == SeatStatus::Held && s.holder == Some(order_id))
            .map(|s| s.number)
            .collect();
        if owned.is_empty() {
            return Err(ReservationError::InvalidState);
        }
        // Held seats always carry a lease expiry; the hold keeps it across updates.
        let first = *owned.iter().next().ok_or(ReservationError::InvalidState)?;
        let lease_expiry = seats[(first - 1) as usize]
            .lease_expiry
            .ok_or(ReservationError::InvalidState)?;
        if lease_expiry < now {
            return Err(ReservationError::InvalidState);
        }

        let conflicts: Vec<u32> = new_seats
            .difference(&owned)
            .copied()
            .filter(|&n| !seats[(n - 1) as usize].is_available())
            .collect();
        if !conflicts.is_empty() {
            return Err(ReservationError::Conflict { seats: conflicts });
        }

        for &n in owned.difference(new_seats) {
            seats[(n - 1) as usize] = Seat::available(n);
        }
        for &n in new_seats.difference(&owned) {
            let seat = &mut seats[(n - 1) as usize];
            seat.status = SeatStatus::Held;
            seat.holder = Some(order_id);
            seat.lease_expiry = Some(lease_expiry);
        }
        Ok(())
    }

    /// Transitions every seat held by the order to Booked and clears the
    /// lease. Fails with `InvalidState` if the order holds no seats or its
    /// lease has lapsed (the seats may be reclaimed by the next sweep).
    pub fn confirm(
        &self,
        screening_id: ScreeningId,
        order_id: OrderId,
    ) -> Result<(), ReservationError> {
        let entry = self.entry(screening_id)?;
        let now = Utc::now();
        let mut seats = entry.seats.lock();

        let held: Vec<u32> = seats
            .iter()
            .filter(|s| s.status == SeatStatus::Held && s.holder == Some(order_id))
            .map(|s| s.number)
            .collect();
        if held.is_empty() {
            return Err(ReservationError::InvalidState);
        }
        if held
            .iter()
            .any(|&n| matches!(seats[(n - 1) as usize].lease_expiry, Some(exp) if exp < now))
        {
            return Err(ReservationError::InvalidState);
        }

        for &n in &held {
            let seat = &mut seats[(n - 1) as usize];
            seat.status = SeatStatus::Booked;
            seat.lease_expiry = None;
        }
        Ok(())
    }

    /// Returns every seat still held by the order to Available. Idempotent:
    /// releasing an order with no held seats, or for an unknown screening,
    /// is a no-op. Booked seats are never released from here.
    pub fn release(&self, screening_id: ScreeningId, order_id: OrderId) -> usize {
        let Some(entry) = self.screenings.read().get(&screening_id).cloned() else {
            return 0;
        };
        let mut seats = entry.seats.lock();
        let mut freed = 0;
        for seat in seats.iter_mut() {
            if seat.status == SeatStatus::Held && seat.holder == Some(order_id) {
                *seat = Seat::available(seat.number);
                freed += 1;
            }
        }
        freed
    }

    /// Point-in-time snapshot of every non-Available seat, ordered by seat
    /// number.
    pub fn snapshot_occupied(
        &self,
        screening_id: ScreeningId,
    ) -> Result<Vec<Seat>, ReservationError> {
        let entry = self.entry(screening_id)?;
        let seats = entry.seats.lock();
        Ok(seats.iter().filter(|s| !s.is_available()).cloned().collect())
    }

    /// Convenience for the sweeper: releases an order's remaining held
    /// seats, keyed by the order record itself.
    pub fn release_order(&self, order: &Order) -> usize {
        self.release(order.screening_id, order.id)
    }

    fn entry(&self, screening_id: ScreeningId) -> Result<Arc<ScreeningEntry>, ReservationError> {
        self.screenings
            .read()
            .get(&screening_id)
            .cloned()
            .ok_or(ReservationError::ScreeningNotFound)
    }
}

impl Default for SeatLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn check_seat_numbers(
    seat_numbers: &BTreeSet<u32>,
    seat_count: u32,
) -> Result<(), ReservationError> {
    for &n in seat_numbers {
        if n == 0 || n > seat_count {
            return Err(ReservationError::Validation(format!(
                "seat number {n} does not exist (valid range 1..={seat_count})"
            )));
        }
    }
    Ok(())
}
