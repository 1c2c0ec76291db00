use crate::feed_logic::state::AppState;
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use futures_util::StreamExt;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

static NEXT_CLIENT_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActAck {
    acknowledged: bool,
    action_count: u64,
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/SpectrumWS", get(ws_handler))
        .route("/SpectrumStatus", get(status_handler))
        .route("/ActOnSpectrum", get(act_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

pub async fn run(
    listener: TcpListener,
    app_state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!(%addr, "Spectrum backend listening");

    axum::serve(listener, router(app_state))
        .with_graceful_shutdown(async move {
            shutdown.recv().await.ok();
            tracing::info!("Downstream server shutting down.");
        })
        .await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.latest().await)
}

async fn act_handler(State(state): State<AppState>) -> impl IntoResponse {
    let acknowledged = state.acknowledge_action().await;
    let action_count = state.action_count();
    tracing::info!(acknowledged, action_count, "ActOnSpectrum received");
    Json(ActAck {
        acknowledged,
        action_count,
    })
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    tracing::info!(client_id, "Client connected");

    let mut data_rx = state.data_tx.subscribe();

    loop {
        tokio::select! {
            msg = socket.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    // The feed is one-way; anything else from the client is ignored.
                    Some(Ok(_)) => {}
                }
            }
            frame = data_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(client_id, skipped, "Client lagging, frames dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!(client_id, "Client disconnected");
}
