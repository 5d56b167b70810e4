use serde::Deserialize;
use std::env;

// Top-level configuration container, one section per concern.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub reservation: ReservationConfig,
}

// Application/server settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Reservation core settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    /// How long a hold stays valid without confirmation.
    pub hold_lease_minutes: i64,
    /// Sweep cadence; must stay below the lease duration to bound staleness.
    pub sweep_interval_seconds: u64,
    pub seats_per_screening: u32,
    pub max_seats_per_order: usize,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_booking=debug,tower_http=debug".to_string()),
            },
            reservation: ReservationConfig {
                hold_lease_minutes: env::var("HOLD_LEASE_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .expect("HOLD_LEASE_MINUTES must be a valid number"),
                sweep_interval_seconds: env::var("SWEEP_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("SWEEP_INTERVAL_SECONDS must be a valid number"),
                seats_per_screening: env::var("SEATS_PER_SCREENING")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .expect("SEATS_PER_SCREENING must be a valid number"),
                max_seats_per_order: env::var("MAX_SEATS_PER_ORDER")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()
                    .expect("MAX_SEATS_PER_ORDER must be a valid number"),
                seed_demo_data: env::var("SEED_DEMO_DATA")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .expect("SEED_DEMO_DATA must be true or false"),
            },
        }
    }
}
