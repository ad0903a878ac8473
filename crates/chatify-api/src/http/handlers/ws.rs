//! WebSocket handler for the live chat connection.
//!
//! `GET /chat?userId=<id>` upgrades to a WebSocket bound to that user for
//! its whole lifetime. Once connected, the handler:
//!
//! - **Pushes envelopes:** registers an mpsc sender with the chat hub and
//!   writes every [`ServerEnvelope`] it receives as a JSON text frame.
//! - **Receives commands:** hands each incoming text frame to the hub, which
//!   decodes and dispatches it. Malformed frames are logged by the hub and
//!   never close the socket.
//!
//! When a newer connection for the same user registers, the hub drops this
//! connection's sender, the push channel closes, and this socket ends.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chatify_types::envelope::ServerEnvelope;
use chatify_types::user::UserId;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Parse the `userId` query value. Integral floats (`"5.0"`) are accepted
/// because the mobile client formats ids through JavaScript numbers.
pub fn parse_user_id(raw: Option<&str>) -> Result<UserId, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("missing userId query parameter".to_string()))?;

    if let Ok(id) = raw.parse::<UserId>() {
        return Ok(id);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(UserId(f as i64)),
        _ => Err(AppError::Validation(format!("userId '{raw}' is not a number"))),
    }
}

/// Validate `userId`, then upgrade.
///
/// Mounted at `/chat` in the router. A missing or non-numeric `userId` is
/// rejected with 400 before any upgrade.
pub async fn chat_ws(
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let user_id = match parse_user_id(query.user_id.as_deref()) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_chat_socket(socket, user_id, state))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// Core connection loop.
///
/// Uses `tokio::select!` to multiplex outbound envelopes from the hub and
/// inbound frames from the client in a single task, so each connection
/// processes its own frames strictly in order.
async fn handle_chat_socket(socket: WebSocket, user_id: UserId, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (push_tx, mut push_rx) = mpsc::unbounded_channel::<ServerEnvelope>();
    let connection = state.hub.connection_opened(user_id, Arc::new(push_tx)).await;

    loop {
        tokio::select! {
            // --- Branch 1: Forward pushed envelopes to the client ---
            envelope = push_rx.recv() => {
                let Some(envelope) = envelope else {
                    tracing::debug!(%user_id, %connection, "Connection replaced, closing socket");
                    break;
                };
                match envelope.to_json() {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            // Client disconnected
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%user_id, kind = envelope.kind(), "Failed to serialize envelope: {err}");
                    }
                }
            }

            // --- Branch 2: Hand client frames to the hub ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        state.hub.envelope_received(user_id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Client disconnected
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!(%user_id, "WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.connection_closed(user_id, connection).await;
}
