use crate::feed_logic::simulator::{Simulator, Tick};
use lib_spectrum::VehicleState;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, broadcast};

/// Frames buffered per websocket client before it starts lagging.
const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    simulator: Arc<Mutex<Simulator>>,
    // Serialized frames fanned out to every websocket client
    pub data_tx: broadcast::Sender<Arc<str>>,
    action_count: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(simulator: Simulator) -> Self {
        let (data_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            simulator: Arc::new(Mutex::new(simulator)),
            data_tx,
            action_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advances the simulation and broadcasts the resulting frame.
    /// Returns the number of clients that received it.
    pub async fn tick(&self) -> usize {
        let tick = self.simulator.lock().await.step();
        let frame: Arc<str> = match tick {
            Tick::Snapshot(state) => match serde_json::to_string(&state) {
                Ok(json) => Arc::from(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize vehicle state");
                    return 0;
                }
            },
            Tick::Malformed(raw) => {
                tracing::debug!("Broadcasting malformed frame");
                Arc::from(raw)
            }
        };
        // No receivers yet is fine.
        self.data_tx.send(frame).unwrap_or(0)
    }

    pub async fn latest(&self) -> VehicleState {
        self.simulator.lock().await.snapshot().clone()
    }

    /// Operator acknowledged the anomaly. Returns whether an action was pending.
    pub async fn acknowledge_action(&self) -> bool {
        let was_required = self.simulator.lock().await.acknowledge();
        self.action_count.fetch_add(1, Ordering::Relaxed);
        was_required
    }

    pub fn action_count(&self) -> u64 {
        self.action_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed_logic::simulator::SimulatorSettings;

    #[tokio::test]
    async fn test_tick_reaches_subscribers() {
        let state = AppState::new(Simulator::new(SimulatorSettings::default(), Some(11)));
        assert_eq!(state.tick().await, 0);

        let mut rx = state.data_tx.subscribe();
        assert_eq!(state.tick().await, 1);
        let frame = rx.recv().await.unwrap();
        let decoded = VehicleState::from_json(&frame).unwrap();
        assert_eq!(decoded, state.latest().await);
    }

    #[tokio::test]
    async fn test_acknowledge_counts_every_call() {
        let settings = SimulatorSettings {
            anomaly_every: 1,
            malformed_every: 0,
        };
        let state = AppState::new(Simulator::new(settings, Some(2)));
        state.tick().await;

        assert!(state.acknowledge_action().await);
        assert!(!state.acknowledge_action().await);
        assert_eq!(state.action_count(), 2);
        assert!(!state.latest().await.is_action_required);
    }
}
