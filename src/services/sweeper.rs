use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::ScreeningId;

use super::ledger::SeatLedger;
use super::notifications::NotificationBus;
use super::reservations::ReservationManager;

/// Reclaims seats whose holder never confirmed in time, independent of any
/// connected client. Explicitly constructed and started; tests call
/// [`sweep_once`](Self::sweep_once) directly instead of waiting on the
/// interval.
pub struct ExpirationSweeper {
    ledger: Arc<SeatLedger>,
    reservations: Arc<ReservationManager>,
    bus: Arc<NotificationBus>,
    interval: Duration,
}

/// Handle to a running sweep loop.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        self.task.abort();
        info!("expiration sweeper stopped");
    }
}

impl ExpirationSweeper {
    pub fn new(
        ledger: Arc<SeatLedger>,
        reservations: Arc<ReservationManager>,
        bus: Arc<NotificationBus>,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            reservations,
            bus,
            interval,
        }
    }

    /// Spawns the periodic sweep loop on the runtime.
    pub fn start(self: Arc<Self>) -> SweeperHandle {
        info!(interval_secs = self.interval.as_secs(), "expiration sweeper started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The immediate first tick catches holds that lapsed while the
            // process was down.
            loop {
                ticker.tick().await;
                self.sweep_once();
            }
        });
        SweeperHandle { task }
    }

    /// One reclaim pass: releases the seats of every Pending order whose
    /// lease lapsed, marks those orders Expired, and emits one
    /// notification per touched screening (not one per order). Safe to
    /// re-run: already-Expired orders and already-released seats are
    /// no-ops. A failure on one order never aborts the rest of the pass.
    ///
    /// Returns the number of orders expired.
    pub fn sweep_once(&self) -> usize {
        let now = Utc::now();
        let lapsed = self.reservations.expired_pending(now);
        if lapsed.is_empty() {
            debug!("sweep: no expired holds");
            return 0;
        }

        info!(count = lapsed.len(), "sweep: reclaiming expired holds");

        let mut touched: HashSet<ScreeningId> = HashSet::new();
        let mut expired = 0;
        for order in &lapsed {
            let freed = self.ledger.release_order(order);
            match self.reservations.mark_expired(order.id) {
                Ok(_) => {
                    expired += 1;
                    touched.insert(order.screening_id);
                    debug!(order_id = %order.id, freed, "sweep: hold expired");
                }
                Err(e) => {
                    // Left for the next tick.
                    warn!(order_id = %order.id, error = %e, "sweep: failed to expire order");
                }
            }
        }

        for screening_id in touched {
            self.bus.publish(screening_id);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::Duration as ChronoDuration;
    use std::collections::BTreeSet;

    fn seats(numbers: &[u32]) -> BTreeSet<u32> {
        numbers.iter().copied().collect()
    }

    struct Fixture {
        ledger: Arc<SeatLedger>,
        reservations: Arc<ReservationManager>,
        bus: Arc<NotificationBus>,
        sweeper: ExpirationSweeper,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(SeatLedger::new());
        let bus = Arc::new(NotificationBus::default());
        let reservations = Arc::new(ReservationManager::new(
            ledger.clone(),
            bus.clone(),
            ChronoDuration::minutes(15),
            4,
        ));
        let sweeper = ExpirationSweeper::new(
            ledger.clone(),
            reservations.clone(),
            bus.clone(),
            Duration::from_secs(60),
        );
        Fixture {
            ledger,
            reservations,
            bus,
            sweeper,
        }
    }

    #[test]
    fn sweep_reclaims_lapsed_holds_and_spares_live_ones() {
        let f = fixture();
        let screening = f.ledger.add_screening("Interstellar", Utc::now(), 10);

        let lapsed = f
            .reservations
            .create_hold_with_lease(screening.id, seats(&[3, 4]), ChronoDuration::minutes(-1))
            .unwrap();
        let live = f
            .reservations
            .create_hold(screening.id, seats(&[7]))
            .unwrap();

        assert_eq!(f.sweeper.sweep_once(), 1);

        assert_eq!(
            f.reservations.get_order(lapsed.id).unwrap().status,
            OrderStatus::Expired
        );
        assert_eq!(
            f.reservations.get_order(live.id).unwrap().status,
            OrderStatus::Pending
        );

        // The reclaimed seats are holdable again.
        f.reservations
            .create_hold(screening.id, seats(&[3, 4]))
            .unwrap();
    }

    #[test]
    fn sweep_is_idempotent() {
        let f = fixture();
        let screening = f.ledger.add_screening("Interstellar", Utc::now(), 10);
        f.reservations
            .create_hold_with_lease(screening.id, seats(&[1]), ChronoDuration::minutes(-1))
            .unwrap();

        assert_eq!(f.sweeper.sweep_once(), 1);
        assert_eq!(f.sweeper.sweep_once(), 0);
        assert!(f.ledger.snapshot_occupied(screening.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_notifies_once_per_screening() {
        let f = fixture();
        let screening = f.ledger.add_screening("Interstellar", Utc::now(), 10);

        // Two lapsed orders on the same screening must coalesce into one
        // notification.
        f.reservations
            .create_hold_with_lease(screening.id, seats(&[1]), ChronoDuration::minutes(-1))
            .unwrap();
        f.reservations
            .create_hold_with_lease(screening.id, seats(&[2]), ChronoDuration::minutes(-1))
            .unwrap();

        let mut sub = f.bus.subscribe(screening.id);
        assert_eq!(f.sweeper.sweep_once(), 2);

        let first = sub.recv().await.unwrap();
        assert_eq!(first.screening_id, screening.id);
        // No second signal queued for this sweep.
        assert!(
            tokio::time::timeout(Duration::from_millis(20), sub.recv())
                .await
                .is_err()
        );
    }
}
