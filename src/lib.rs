pub mod config;
pub mod controllers;
pub mod models;
pub mod services;

use std::sync::Arc;

use chrono::Duration;

use config::Config;
use services::{NotificationBus, ReservationManager, SeatLedger};

// Shared state for the whole application.
pub struct AppState {
    pub ledger: Arc<SeatLedger>,
    pub reservations: Arc<ReservationManager>,
    pub bus: Arc<NotificationBus>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let ledger = Arc::new(SeatLedger::new());
        let bus = Arc::new(NotificationBus::default());
        let reservations = Arc::new(ReservationManager::new(
            ledger.clone(),
            bus.clone(),
            Duration::minutes(config.reservation.hold_lease_minutes),
            config.reservation.max_seats_per_order,
        ));
        Arc::new(Self {
            ledger,
            reservations,
            bus,
            config,
        })
    }
}
