pub mod error;
pub mod ledger;
pub mod notifications;
pub mod reservations;
pub mod seeder;
pub mod sweeper;

pub use error::ReservationError;
pub use ledger::SeatLedger;
pub use notifications::{NotificationBus, SeatsChanged, Subscription};
pub use reservations::ReservationManager;
pub use sweeper::{ExpirationSweeper, SweeperHandle};
