//! # Spectrum WSS Ingestor
//!
//! WebSocket client for the live vehicle state feed (`<base_ws_url>/SpectrumWS`).
//!
//! `SpectrumFeed::subscribe` spawns one task that owns the socket and hands the
//! consumer a [`FeedSubscription`]:
//!
//! - every well-formed message becomes `FeedEvent::State` and replaces the latest
//!   snapshot (no merge), clearing the last error;
//! - a malformed message becomes `FeedEvent::Error(FeedError::Parse)` and the
//!   stream keeps going;
//! - a failed connect, transport error or remote close becomes
//!   `FeedEvent::Error(FeedError::Connection)` and moves the feed to `Errored`.
//!
//! ```text
//! Disconnected -> Connecting -> Streaming -> Streaming ...
//!                     any    -> Errored
//!                     any    -> Closed      (cancel only)
//! ```
//!
//! The socket is read regardless of the consumer. `latest`, `last_error` and
//! `state` always follow the wire; when the event buffer is full, snapshots and
//! parse errors are dropped from the event stream and counted in
//! [`FeedSubscription::dropped_events`].
//!
//! With [`ReconnectPolicy::Disabled`] (the default) `Errored` is terminal and the
//! event stream ends; recovering means creating a new subscription. With
//! [`ReconnectPolicy::ExponentialBackoff`] the task waits and goes back to
//! `Connecting` until the retry budget is spent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use rand::Rng;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::telemetry::vehicle_state::VehicleState;

/// Endpoint name of the vehicle state feed.
pub const DEFAULT_FEED_ENDPOINT: &str = "SpectrumWS";

/// Events buffered between the socket task and a slow consumer.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Errors surfaced by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// An inbound message was not a valid `VehicleState`. The feed continues.
    #[error("Failed to parse feed message: {0}")]
    Parse(String),

    /// The transport failed or was closed by the remote host.
    #[error("Feed connection error: {0}")]
    Connection(String),

    /// The configured feed URL is unusable.
    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Created, socket task not started yet.
    Disconnected,
    /// Opening the WebSocket.
    Connecting,
    /// Connected and delivering messages.
    Streaming,
    /// Transport failed. Terminal unless a reconnect policy is active.
    Errored,
    /// Cancelled by the consumer.
    Closed,
}

/// One item delivered to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A fresh snapshot.
    State(VehicleState),
    /// A parse or connection error.
    Error(FeedError),
}

/// What the socket task does after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Stay in `Errored`.
    #[default]
    Disabled,
    /// Retry with `min(base_delay * 2^attempt, max_delay)`. With `jitter` the
    /// actual wait is drawn from `[ceiling / 2, ceiling]`.
    ExponentialBackoff {
        base_delay: Duration,
        max_delay: Duration,
        max_retries: u32,
        jitter: bool,
    },
}

impl ReconnectPolicy {
    /// Upper bound of the wait before retry number `attempt` (0-based), or
    /// `None` when no further retry is allowed.
    pub fn backoff_ceiling(&self, attempt: u32) -> Option<Duration> {
        match *self {
            ReconnectPolicy::Disabled => None,
            ReconnectPolicy::ExponentialBackoff {
                base_delay,
                max_delay,
                max_retries,
                ..
            } => {
                if attempt >= max_retries {
                    return None;
                }
                let factor = 2u32.saturating_pow(attempt);
                Some(base_delay.saturating_mul(factor).min(max_delay))
            }
        }
    }

    /// Actual wait before retry number `attempt`, jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        let ceiling = self.backoff_ceiling(attempt)?;
        match *self {
            ReconnectPolicy::ExponentialBackoff { jitter: true, .. } => {
                let ceiling_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
                let floor_ms = ceiling_ms / 2;
                Some(Duration::from_millis(rand::rng().random_range(floor_ms..=ceiling_ms)))
            }
            _ => Some(ceiling),
        }
    }
}

/// Where and how to subscribe.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket base URL, e.g. `ws://127.0.0.1:9003`.
    pub base_ws_url: String,
    /// Feed endpoint appended to the base URL.
    pub endpoint: String,
    /// Behaviour after a transport failure.
    pub reconnect: ReconnectPolicy,
    /// Capacity of the event channel.
    pub channel_capacity: usize,
}

impl FeedConfig {
    /// Config for the default `SpectrumWS` endpoint without reconnects.
    pub fn new(base_ws_url: impl Into<String>) -> Self {
        Self {
            base_ws_url: base_ws_url.into(),
            endpoint: DEFAULT_FEED_ENDPOINT.to_string(),
            reconnect: ReconnectPolicy::Disabled,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Replaces the reconnect policy.
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Replaces the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// `<base_ws_url>/<endpoint>`, validated as a ws:// or wss:// URL.
    pub fn feed_url(&self) -> Result<Url, FeedError> {
        let raw = format!(
            "{}/{}",
            self.base_ws_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        let url = Url::parse(&raw).map_err(|e| FeedError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(FeedError::InvalidUrl {
                url: raw,
                reason: format!("unsupported scheme '{other}', expected ws or wss"),
            }),
        }
    }
}

/// Entry point for live feed subscriptions.
pub struct SpectrumFeed;

impl SpectrumFeed {
    /// Opens a subscription. Must be called from within a tokio runtime.
    ///
    /// No snapshot is available until the first message arrives;
    /// [`FeedSubscription::latest`] returns `None` until then.
    pub fn subscribe(config: FeedConfig) -> Result<FeedSubscription, FeedError> {
        let url = config.feed_url()?;
        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(FeedState::Disconnected);
        let (latest_tx, latest_rx) = watch::channel(None);
        let (error_tx, error_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let dropped = Arc::new(AtomicU64::new(0));

        let task = FeedTask {
            url,
            policy: config.reconnect,
            events_tx,
            state_tx,
            latest_tx,
            error_tx,
            cancel: cancel.clone(),
            dropped: dropped.clone(),
            lagging: AtomicBool::new(false),
        };
        let handle = tokio::spawn(task.run());

        Ok(FeedSubscription {
            events: events_rx,
            state: state_rx,
            latest: latest_rx,
            last_error: error_rx,
            cancel,
            dropped,
            task: Some(handle),
        })
    }
}

/// Consumer side of a live feed. Dropping it cancels the feed.
pub struct FeedSubscription {
    events: mpsc::Receiver<FeedEvent>,
    state: watch::Receiver<FeedState>,
    latest: watch::Receiver<Option<VehicleState>>,
    last_error: watch::Receiver<Option<FeedError>>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl FeedSubscription {
    /// Next snapshot or error. `None` once the feed is closed or terminally errored
    /// and every buffered event has been read.
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    /// Most recent snapshot, `None` while no data has arrived yet.
    pub fn latest(&self) -> Option<VehicleState> {
        self.latest.borrow().clone()
    }

    /// Most recent error, cleared by the next good snapshot.
    pub fn last_error(&self) -> Option<FeedError> {
        self.last_error.borrow().clone()
    }

    /// Events discarded because the consumer fell behind. `latest` is
    /// unaffected.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FeedState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Releases the transport. Safe to call any number of times.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Cancelling Spectrum feed subscription");
        }
        self.cancel.cancel();
    }

    /// True once [`cancel`](Self::cancel) was called or the handle was dropped.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels and waits for the socket task to finish.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Spectrum feed task ended abnormally");
            }
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum StreamEnd {
    Cancelled,
    ConsumerGone,
    Failed(FeedError),
}

struct FeedTask {
    url: Url,
    policy: ReconnectPolicy,
    events_tx: mpsc::Sender<FeedEvent>,
    state_tx: watch::Sender<FeedState>,
    latest_tx: watch::Sender<Option<VehicleState>>,
    error_tx: watch::Sender<Option<FeedError>>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
    lagging: AtomicBool,
}

impl FeedTask {
    /// Connect / stream / back off loop.
    async fn run(self) {
        let mut attempt: u32 = 0;

        loop {
            self.set_state(FeedState::Connecting);
            tracing::info!(url = %self.url, "Connecting to Spectrum feed");

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = connect_async(self.url.as_str()) => result,
            };

            let failure = match connected {
                Ok((ws_stream, _)) => {
                    attempt = 0;
                    self.set_state(FeedState::Streaming);
                    tracing::info!("Connected to Spectrum feed");

                    match self.stream(ws_stream).await {
                        StreamEnd::Cancelled | StreamEnd::ConsumerGone => break,
                        StreamEnd::Failed(err) => err,
                    }
                }
                Err(e) => FeedError::Connection(e.to_string()),
            };

            tracing::error!(error = %failure, "Spectrum feed failed");
            self.set_state(FeedState::Errored);
            if !self.report(failure).await {
                break;
            }

            let Some(delay) = self.policy.delay_for(attempt) else {
                tracing::warn!("No reconnect scheduled, Spectrum feed stays errored");
                return;
            };
            attempt = attempt.saturating_add(1);
            tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting to Spectrum feed");

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        self.set_state(FeedState::Closed);
        tracing::info!("Spectrum feed closed");
    }

    async fn stream(&self, mut ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> StreamEnd {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    if let Err(e) = ws_stream.close(None).await {
                        tracing::debug!(error = %e, "Error while closing Spectrum feed socket");
                    }
                    return StreamEnd::Cancelled;
                }
                msg = ws_stream.next() => {
                    let delivered = match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            self.handle_payload(VehicleState::from_json(text.as_str()))
                        }
                        Some(Ok(WsMessage::Binary(bin))) => {
                            self.handle_payload(VehicleState::from_slice(&bin))
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            let reason = frame
                                .map(|f| format!(" ({}: {})", f.code, f.reason.as_str()))
                                .unwrap_or_default();
                            return StreamEnd::Failed(FeedError::Connection(format!(
                                "Stream closed by remote host{reason}"
                            )));
                        }
                        // Pings are answered by tungstenite itself.
                        Some(Ok(_)) => true,
                        Some(Err(e)) => return StreamEnd::Failed(FeedError::Connection(e.to_string())),
                        None => {
                            return StreamEnd::Failed(FeedError::Connection(
                                "Stream closed by remote host".to_string(),
                            ))
                        }
                    };

                    if !delivered {
                        return StreamEnd::ConsumerGone;
                    }
                }
            }
        }
    }

    /// Never waits on the consumer, so the read loop keeps draining the socket.
    fn handle_payload(&self, parsed: Result<VehicleState, serde_json::Error>) -> bool {
        match parsed {
            Ok(state) => {
                tracing::trace!(?state, "Vehicle state received");
                self.latest_tx.send_replace(Some(state.clone()));
                self.error_tx.send_replace(None);
                self.offer(FeedEvent::State(state))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed feed message");
                let err = FeedError::Parse(e.to_string());
                self.error_tx.send_replace(Some(err.clone()));
                self.offer(FeedEvent::Error(err))
            }
        }
    }

    /// False when the consumer is gone. A full buffer drops the event.
    fn offer(&self, event: FeedEvent) -> bool {
        match self.events_tx.try_send(event) {
            Ok(()) => {
                if self.lagging.swap(false, Ordering::Relaxed) {
                    tracing::info!(dropped = self.dropped.load(Ordering::Relaxed), "Spectrum feed consumer caught up");
                }
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if !self.lagging.swap(true, Ordering::Relaxed) {
                    tracing::warn!("Spectrum feed consumer is lagging, dropping events");
                }
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    async fn report(&self, err: FeedError) -> bool {
        self.error_tx.send_replace(Some(err.clone()));
        self.deliver(FeedEvent::Error(err)).await
    }

    /// Waits for buffer space; only used once the socket is gone.
    /// False when the consumer is gone or the feed was cancelled mid-send.
    async fn deliver(&self, event: FeedEvent) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            sent = self.events_tx.send(event) => sent.is_ok(),
        }
    }

    fn set_state(&self, state: FeedState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(?previous, current = ?state, "Spectrum feed state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    fn backoff(jitter: bool) -> ReconnectPolicy {
        ReconnectPolicy::ExponentialBackoff {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            max_retries: 5,
            jitter,
        }
    }

    #[test]
    fn test_disabled_policy_never_retries() {
        assert_eq!(ReconnectPolicy::Disabled.delay_for(0), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = backoff(false);
        assert_eq!(policy.delay_for(0), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_millis(800)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_for(5), None);
    }

    #[test]
    fn test_jitter_stays_within_half_ceiling() {
        let policy = backoff(true);
        for attempt in 0..5 {
            let ceiling = policy.backoff_ceiling(attempt).unwrap();
            let delay = policy.delay_for(attempt).unwrap();
            assert!(delay <= ceiling);
            assert!(delay >= ceiling / 2);
        }
    }

    #[test]
    fn test_feed_url_joins_endpoint() {
        let url = FeedConfig::new("ws://localhost:9003/").feed_url().unwrap();
        assert_eq!(url.as_str(), "ws://localhost:9003/SpectrumWS");
    }

    #[test]
    fn test_feed_url_rejects_http_scheme() {
        let err = FeedConfig::new("http://localhost:9003").feed_url().unwrap_err();
        assert!(matches!(err, FeedError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_parse_error_does_not_end_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(WsMessage::Text("not json".into())).await.unwrap();
            let good = r#"{"Velocity":1.5,"Altitude":-10,"Temperature":2,"StatusMessage":"Nominal","IsAscending":true,"IsActionRequired":false}"#;
            ws.send(WsMessage::Text(good.into())).await.unwrap();
            // Keep the socket open until the client hangs up.
            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut sub = SpectrumFeed::subscribe(FeedConfig::new(format!("ws://127.0.0.1:{port}"))).unwrap();
        assert!(sub.latest().is_none());

        match sub.next_event().await {
            Some(FeedEvent::Error(FeedError::Parse(_))) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
        match sub.next_event().await {
            Some(FeedEvent::State(state)) => assert_eq!(state.status_message, "Nominal"),
            other => panic!("expected state, got {other:?}"),
        }

        assert_eq!(sub.state(), FeedState::Streaming);
        assert!(sub.last_error().is_none());
        assert_eq!(sub.latest().map(|s| s.velocity), Some(1.5));

        sub.cancel();
        sub.cancel();
        sub.shutdown().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_is_terminal_without_policy() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut sub = SpectrumFeed::subscribe(FeedConfig::new(format!("ws://127.0.0.1:{port}"))).unwrap();
        match sub.next_event().await {
            Some(FeedEvent::Error(FeedError::Connection(_))) => {}
            other => panic!("expected connection error, got {other:?}"),
        }
        assert_eq!(sub.next_event().await, None);
        assert_eq!(sub.state(), FeedState::Errored);
    }
}
