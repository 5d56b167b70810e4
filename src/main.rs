use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking::{
    config::Config,
    controllers,
    services::{seeder, ExpirationSweeper},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cinema Booking API");

    let state = AppState::new(config.clone());

    if config.reservation.seed_demo_data {
        seeder::seed_screenings(&state.ledger, config.reservation.seats_per_screening);
    }

    // --- Start background tasks ---

    // Reclaims lapsed holds every sweep interval.
    let sweeper = Arc::new(ExpirationSweeper::new(
        state.ledger.clone(),
        state.reservations.clone(),
        state.bus.clone(),
        Duration::from_secs(config.reservation.sweep_interval_seconds),
    ));
    let sweeper_handle = sweeper.start();

    // --- Start the web server ---

    let app = Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        // Mount the routes from the controllers module
        .nest("/api", controllers::routes())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper_handle.stop();
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
