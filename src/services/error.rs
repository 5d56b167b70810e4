use thiserror::Error;

/// Error taxonomy for the reservation core. All variants are reported
/// synchronously to the caller; the core never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("{0}")]
    Validation(String),

    #[error("screening not found")]
    ScreeningNotFound,

    #[error("order not found")]
    OrderNotFound,

    /// Requested seats are not available; carries every contended seat number.
    #[error("seats {} are not available", format_seats(.seats))]
    Conflict { seats: Vec<u32> },

    /// Operation not legal for the order's current status.
    #[error("operation not allowed for the order's current status")]
    InvalidState,

    /// The hold lease has lapsed even if the sweeper has not reclaimed it yet.
    #[error("order has expired and can no longer be modified")]
    Expired,
}

fn format_seats(seats: &[u32]) -> String {
    seats
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
