//! # Spectrum Backend Simulator
//!
//! Serves a simulated launch vehicle to the dashboard:
//!
//! - `GET /SpectrumWS`: websocket, one PascalCase `VehicleState` JSON per tick
//! - `GET /SpectrumStatus`: latest state as JSON
//! - `GET /ActOnSpectrum`: acknowledges a pending operator action
//! - `GET /health`

use anyhow::Result;
use clap::Parser;
use lib_spectrum::loggers::setup_logging;
use tokio::signal;

mod feed_logic;
use feed_logic::config::{self, Config};
use feed_logic::simulator::{Simulator, SimulatorSettings};
use feed_logic::{downstream, state, ticker};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Explicitly install the default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let settings = config::load_config(Config::parse())?;
    let _log_guard = setup_logging("server_spectrum", &settings.log_dir, &settings.log_level, true)?;
    tracing::info!(?settings, "Configuration loaded");

    let simulator = Simulator::new(
        SimulatorSettings {
            anomaly_every: settings.anomaly_every,
            malformed_every: settings.malformed_every,
        },
        settings.seed,
    );
    let app_state = state::AppState::new(simulator);

    let listener = tokio::net::TcpListener::bind((settings.bind_address.as_str(), settings.port)).await?;
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let ticker_handle = tokio::spawn(ticker::run(settings.tick, app_state.clone(), shutdown_tx.subscribe()));
    let downstream_handle = tokio::spawn(downstream::run(listener, app_state.clone(), shutdown_tx.subscribe()));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            tracing::info!("SIGTERM received, initiating shutdown.");
        }
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    let (ticker_result, downstream_result) = tokio::join!(ticker_handle, downstream_handle);
    if let Err(e) = ticker_result {
        tracing::error!(error = %e, "Simulator task failed");
    }
    match downstream_result {
        Ok(Err(e)) => tracing::error!(error = %e, "Downstream server failed"),
        Err(e) => tracing::error!(error = %e, "Downstream task failed"),
        Ok(Ok(())) => {}
    }

    tracing::info!(actions = app_state.action_count(), "Shutdown complete.");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    // On non-unix platforms, just wait forever.
    std::future::pending::<()>().await;
}
