//! # Project Test Support
//!
//! An in-process stand-in for the vehicle backend, bound to an ephemeral port,
//! used by the integration tests under `tests/`.
//!
//! Each websocket connection replays the configured frames in order, then
//! either closes the socket or keeps it open until the client leaves.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A well-formed PascalCase vehicle state frame.
pub fn state_frame(velocity: f64, status: &str, action_required: bool) -> String {
    serde_json::json!({
        "Velocity": velocity,
        "Altitude": -40000.0,
        "Temperature": 4.0,
        "StatusMessage": status,
        "IsAscending": true,
        "IsActionRequired": action_required,
    })
    .to_string()
}

/// Behaviour of a [`MockBackend`].
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Text frames sent on every websocket connection.
    pub frames: Vec<String>,
    /// Close the socket once all frames are sent.
    pub close_after_frames: bool,
    /// Status answered by `/ActOnSpectrum`.
    pub act_status: StatusCode,
    /// Body answered by `/ActOnSpectrum`.
    pub act_body: String,
    /// Delay before `/ActOnSpectrum` answers.
    pub act_delay: Duration,
    /// Body answered by `/SpectrumStatus`.
    pub status_body: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            close_after_frames: false,
            act_status: StatusCode::OK,
            act_body: String::new(),
            act_delay: Duration::ZERO,
            status_body: state_frame(0.0, "Nominal", false),
        }
    }
}

#[derive(Clone)]
struct MockState {
    options: Arc<MockOptions>,
    act_hits: Arc<AtomicUsize>,
    ws_connections: Arc<AtomicUsize>,
}

/// Running mock backend. Dropping it stops the server.
pub struct MockBackend {
    /// `http://127.0.0.1:<port>`
    pub http_base: String,
    /// `ws://127.0.0.1:<port>`
    pub ws_base: String,
    state: MockState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Binds an ephemeral port and starts serving.
    pub async fn start(options: MockOptions) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = MockState {
            options: Arc::new(options),
            act_hits: Arc::new(AtomicUsize::new(0)),
            ws_connections: Arc::new(AtomicUsize::new(0)),
        };

        let app = Router::new()
            .route("/SpectrumWS", get(ws_handler))
            .route("/SpectrumStatus", get(status_handler))
            .route("/ActOnSpectrum", get(act_handler))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Ok(Self {
            http_base: format!("http://{addr}"),
            ws_base: format!("ws://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Requests received by `/ActOnSpectrum`.
    pub fn act_hits(&self) -> usize {
        self.state.act_hits.load(Ordering::SeqCst)
    }

    /// Websocket connections accepted so far.
    pub fn ws_connections(&self) -> usize {
        self.state.ws_connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<MockState>) -> impl IntoResponse {
    state.ws_connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| replay(socket, state.options))
}

async fn replay(mut socket: WebSocket, options: Arc<MockOptions>) {
    for frame in &options.frames {
        if socket.send(Message::Text(frame.clone().into())).await.is_err() {
            return;
        }
    }

    if options.close_after_frames {
        let _ = socket.send(Message::Close(None)).await;
    } else {
        while let Some(Ok(msg)) = socket.recv().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    }
}

async fn status_handler(State(state): State<MockState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        state.options.status_body.clone(),
    )
}

async fn act_handler(State(state): State<MockState>) -> impl IntoResponse {
    state.act_hits.fetch_add(1, Ordering::SeqCst);
    if !state.options.act_delay.is_zero() {
        tokio::time::sleep(state.options.act_delay).await;
    }
    (state.options.act_status, state.options.act_body.clone())
}
