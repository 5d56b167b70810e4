use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use cinema_booking::models::{OrderStatus, SeatStatus};
use cinema_booking::services::{
    ExpirationSweeper, NotificationBus, ReservationError, ReservationManager, SeatLedger,
};

fn seats(numbers: &[u32]) -> BTreeSet<u32> {
    numbers.iter().copied().collect()
}

struct TestApp {
    ledger: Arc<SeatLedger>,
    reservations: Arc<ReservationManager>,
    bus: Arc<NotificationBus>,
    sweeper: ExpirationSweeper,
}

fn test_app(seat_count: u32) -> (TestApp, cinema_booking::models::ScreeningId) {
    let ledger = Arc::new(SeatLedger::new());
    let bus = Arc::new(NotificationBus::default());
    let reservations = Arc::new(ReservationManager::new(
        ledger.clone(),
        bus.clone(),
        Duration::minutes(15),
        4,
    ));
    let sweeper = ExpirationSweeper::new(
        ledger.clone(),
        reservations.clone(),
        bus.clone(),
        StdDuration::from_secs(60),
    );
    let screening = ledger.add_screening("The Dark Knight", Utc::now(), seat_count);
    (
        TestApp {
            ledger,
            reservations,
            bus,
            sweeper,
        },
        screening.id,
    )
}

#[test]
fn conflict_then_sweep_then_retry() {
    let (app, screening) = test_app(10);

    // First caller holds seats 3 and 4; the backdated lease stands in for
    // a hold whose 15 minutes have run out.
    let first = app
        .reservations
        .create_hold_with_lease(screening, seats(&[3, 4]), Duration::minutes(-1))
        .unwrap();
    assert_eq!(first.status, OrderStatus::Pending);

    // Second caller collides on seat 4 only.
    let err = app
        .reservations
        .create_hold(screening, seats(&[4, 5]))
        .unwrap_err();
    assert_eq!(err, ReservationError::Conflict { seats: vec![4] });

    // The first hold's lease is already in the past; one sweep tick
    // reclaims it.
    assert_eq!(app.sweeper.sweep_once(), 1);
    assert_eq!(
        app.reservations.get_order(first.id).unwrap().status,
        OrderStatus::Expired
    );

    // Seat 4 is available again, so the retry goes through.
    let retry = app
        .reservations
        .create_hold(screening, seats(&[4, 5]))
        .unwrap();
    assert_eq!(retry.seat_numbers, seats(&[4, 5]));
}

#[test]
fn update_swaps_seats_under_the_same_lease() {
    let (app, screening) = test_app(10);

    let order = app
        .reservations
        .create_hold(screening, seats(&[1, 2]))
        .unwrap();
    let updated = app.reservations.update_hold(order.id, seats(&[2, 3])).unwrap();

    assert_eq!(updated.seat_numbers, seats(&[2, 3]));
    assert_eq!(updated.expires_at, order.expires_at);

    let occupied = app.ledger.snapshot_occupied(screening).unwrap();
    let numbers: Vec<u32> = occupied.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![2, 3]);
    for seat in &occupied {
        assert_eq!(seat.status, SeatStatus::Held);
        assert_eq!(seat.holder, Some(order.id));
        assert_eq!(seat.lease_expiry, Some(order.expires_at));
    }
}

#[test]
fn emptying_the_seat_set_cancels_without_a_sweep() {
    let (app, screening) = test_app(10);

    let order = app
        .reservations
        .create_hold(screening, seats(&[1, 2]))
        .unwrap();
    let cancelled = app.reservations.update_hold(order.id, seats(&[])).unwrap();

    assert_eq!(cancelled.status, OrderStatus::Expired);
    assert!(app.ledger.snapshot_occupied(screening).unwrap().is_empty());
}

#[test]
fn confirmed_seats_survive_sweeps_indefinitely() {
    let (app, screening) = test_app(10);

    let order = app
        .reservations
        .create_hold(screening, seats(&[1, 2]))
        .unwrap();
    app.reservations.confirm(order.id).unwrap();

    assert_eq!(app.sweeper.sweep_once(), 0);

    let occupied = app.ledger.snapshot_occupied(screening).unwrap();
    assert_eq!(occupied.len(), 2);
    assert!(occupied.iter().all(|s| s.status == SeatStatus::Booked));

    // And nobody else can take them.
    let err = app
        .reservations
        .create_hold(screening, seats(&[2]))
        .unwrap_err();
    assert_eq!(err, ReservationError::Conflict { seats: vec![2] });
}

#[test]
fn racing_holds_on_overlapping_seats_let_exactly_one_win() {
    let (app, screening) = test_app(10);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let reservations = app.reservations.clone();
        handles.push(std::thread::spawn(move || {
            reservations.create_hold(screening, seats(&[4, 5]))
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.join().expect("hold thread panicked") {
            Ok(_) => winners += 1,
            Err(ReservationError::Conflict { seats }) => {
                // The loser is told exactly which seats were contended.
                assert!(!seats.is_empty());
                assert!(seats.iter().all(|n| [4, 5].contains(n)));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn mutations_notify_subscribers_of_that_screening_only() {
    let (app, screening) = test_app(10);
    let other = app.ledger.add_screening("Inception", Utc::now(), 10);

    let mut sub = app.bus.subscribe(screening);
    let mut other_sub = app.bus.subscribe(other.id);

    let order = app
        .reservations
        .create_hold(screening, seats(&[1]))
        .unwrap();
    app.reservations.confirm(order.id).unwrap();

    // Two mutations on `screening`, none on `other`.
    assert_eq!(sub.recv().await.unwrap().screening_id, screening);
    assert_eq!(sub.recv().await.unwrap().screening_id, screening);
    assert!(
        tokio::time::timeout(StdDuration::from_millis(20), other_sub.recv())
            .await
            .is_err()
    );
}

proptest! {
    // Any interleaving of holds over a small seat pool: no seat is ever
    // owned by two orders, and no order exceeds the four-seat cap.
    #[test]
    fn holds_never_overlap(requests in proptest::collection::vec(
        proptest::collection::btree_set(1u32..=8, 1..=4),
        1..12,
    )) {
        let (app, screening) = test_app(8);

        let mut granted: Vec<BTreeSet<u32>> = Vec::new();
        for request in requests {
            if let Ok(order) = app.reservations.create_hold(screening, request.clone()) {
                prop_assert!(order.seat_numbers.len() <= 4);
                for earlier in &granted {
                    prop_assert!(earlier.is_disjoint(&order.seat_numbers));
                }
                granted.push(order.seat_numbers);
            }
        }

        // The ledger agrees with the sum of all granted holds.
        let occupied: BTreeSet<u32> = app
            .ledger
            .snapshot_occupied(screening)
            .unwrap()
            .iter()
            .map(|s| s.number)
            .collect();
        let expected: BTreeSet<u32> = granted.iter().flatten().copied().collect();
        prop_assert_eq!(occupied, expected);
    }
}
