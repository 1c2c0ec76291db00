use crate::feed_logic::state::AppState;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{MissedTickBehavior, interval};

/// Drives the simulator at a fixed cadence until shutdown.
pub async fn run(tick: Duration, app_state: AppState, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Simulator received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {
                let receivers = app_state.tick().await;
                tracing::trace!(receivers, "Vehicle state broadcast");
            }
        }
    }
}
