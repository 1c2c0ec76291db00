//! # Spectrum Monitor
//!
//! Terminal dashboard. Subscribes to the live feed, redraws the dashboard on
//! every snapshot and lets the operator act on the vehicle from stdin.

use anyhow::Result;
use clap::Parser;
use lib_spectrum::loggers::setup_logging;
use lib_spectrum::{
    ActionTrigger, ApiClient, ColorTable, FeedEvent, SpectrumFeed, VehicleConfig, VehicleState,
    fetch_vehicle_state, retrieve::STATUS_ENDPOINT,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

mod monitor_logic;
use monitor_logic::config::{self, Config};
use monitor_logic::console::{self, HELP, OperatorCommand};
use monitor_logic::view::DashboardView;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Explicitly install the default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let settings = config::load_config(Config::parse())?;
    let _log_guard = setup_logging(
        "spectrum_monitor",
        &settings.log_dir,
        &settings.log_level,
        settings.log_console,
    )?;
    if settings.no_color {
        colored::control::set_override(false);
    }
    tracing::info!(?settings, "Configuration loaded");

    let mut view = DashboardView::new(VehicleConfig::default(), ColorTable::default());

    let trigger = ActionTrigger::for_backend(&settings.api_base_url)?;
    let status_client = ApiClient::new(&settings.api_base_url, None)?;
    let mut subscription = SpectrumFeed::subscribe(settings.feed.clone())?;
    let mut state_rx = subscription.watch_state();

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<OperatorCommand>(16);
    tokio::spawn(read_commands(cmd_tx));
    let (refresh_tx, mut refresh_rx) = mpsc::channel::<VehicleState>(4);

    println!("{}", view.render_current());
    println!("{HELP}");

    let mut feed_state = subscription.state();
    let mut feed_open = true;
    let mut state_open = true;
    let mut commands_open = true;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down.");
                break;
            }
            event = subscription.next_event(), if feed_open => {
                match event {
                    Some(FeedEvent::State(state)) => println!("\n{}", view.show(state)),
                    Some(FeedEvent::Error(e)) => {
                        tracing::warn!(error = %e, "Feed error");
                        println!("\n{}", console::render_error());
                    }
                    None => {
                        tracing::warn!("Feed ended, type `quit` to exit");
                        feed_open = false;
                    }
                }
            }
            Some(state) = refresh_rx.recv() => println!("\n{}", view.show(state)),
            changed = state_rx.changed(), if state_open => {
                match changed {
                    Ok(()) => {
                        feed_state = *state_rx.borrow_and_update();
                        tracing::info!(state = ?feed_state, "Feed state changed");
                    }
                    Err(_) => state_open = false,
                }
            }
            command = cmd_rx.recv(), if commands_open => {
                match command {
                    Some(OperatorCommand::Quit) => break,
                    Some(OperatorCommand::Act) => {
                        let action_required = view.action_required();
                        let trigger = trigger.clone();
                        tokio::spawn(async move {
                            let outcome = trigger.trigger(action_required).await;
                            println!("{}", console::render_outcome(&outcome));
                        });
                    }
                    Some(OperatorCommand::Refresh) => {
                        let client = status_client.clone();
                        let refresh_tx = refresh_tx.clone();
                        tokio::spawn(async move {
                            match fetch_vehicle_state(&client, STATUS_ENDPOINT).await {
                                Ok(state) => {
                                    let _ = refresh_tx.send(state).await;
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "Status refresh failed");
                                    println!("{}", console::render_error());
                                }
                            }
                        });
                    }
                    Some(OperatorCommand::Status) => {
                        let action = trigger.is_enabled(view.action_required());
                        println!("{}  action enabled: {action}", console::render_state(feed_state));
                    }
                    Some(OperatorCommand::Help) => println!("{HELP}"),
                    None => {
                        tracing::debug!("stdin closed");
                        commands_open = false;
                    }
                }
            }
        }
    }

    subscription.shutdown().await;
    tracing::info!("Monitor stopped");
    Ok(())
}

async fn read_commands(tx: mpsc::Sender<OperatorCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match OperatorCommand::parse(&line) {
                Some(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => println!("unknown command '{}', {HELP}", line.trim()),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}
