pub mod screening;
pub mod seat;
pub mod order;

pub use screening::{Screening, ScreeningId};
pub use seat::{Seat, SeatStatus};
pub use order::{Order, OrderId, OrderStatus};
