//! WebSocket transport adapter.
//!
//! Each accepted connection gets its own task that shuttles frames
//! between the socket and the registry actor: inbound text frames are
//! parsed into [`ClientEvent`]s and forwarded to the registry; outbound
//! [`ServerEvent`]s arrive on a per-connection channel and are
//! serialized onto the socket. The task never touches registry state
//! directly.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::errors::SrError;
use crate::observability::metrics::{record_event_latency, record_message_dropped};
use crate::protocol::{ClientEvent, ServerEvent, SignalKind};
use crate::registry::{ConnectionId, RegistryHandle};
use crate::routes::AppState;

/// Query parameters accepted on the WebSocket upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Upgrade handler for `GET /ws`.
///
/// When token enforcement is enabled, the access token is checked
/// before the upgrade completes; a bad token yields a plain 401 rather
/// than a WebSocket close frame.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, SrError> {
    if state.config.require_token {
        let token = params
            .token
            .as_deref()
            .ok_or_else(|| SrError::Unauthorized("missing token".to_string()))?;

        common::token::validate_token(&state.config.token_secret, state.config.app_id, token)
            .map_err(|e| SrError::Unauthorized(format!("token rejected: {e:?}")))?;
    }

    let registry = state.registry.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, registry)))
}

/// Drive one WebSocket connection until either side closes.
async fn handle_socket(socket: WebSocket, registry: RegistryHandle) {
    let connection_id = ConnectionId::new();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
    registry.register(connection_id, outbound_tx.clone());

    tracing::info!(
        target: "sr.ws",
        connection_id = %connection_id,
        "WebSocket connection opened"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                let Some(event) = outbound else {
                    // Registry dropped our sender: shutdown in progress.
                    break;
                };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if ws_sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            target: "sr.ws",
                            connection_id = %connection_id,
                            error = %e,
                            "Failed to serialize outbound event"
                        );
                    }
                }
            }
            inbound = ws_stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_frame(&registry, connection_id, &outbound_tx, &text);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // The protocol is JSON text only.
                        reject_frame(&outbound_tx);
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(
                            target: "sr.ws",
                            connection_id = %connection_id,
                            error = %e,
                            "WebSocket read error"
                        );
                        break;
                    }
                }
            }
        }
    }

    registry.disconnect(connection_id);
    tracing::info!(
        target: "sr.ws",
        connection_id = %connection_id,
        "WebSocket connection closed"
    );
}

/// Parse one inbound text frame and forward it to the registry.
///
/// A frame that fails schema validation never reaches the registry: the
/// client gets an error event back and the drop is counted.
pub(crate) fn dispatch_frame(
    registry: &RegistryHandle,
    connection_id: ConnectionId,
    outbound: &mpsc::UnboundedSender<ServerEvent>,
    text: &str,
) {
    let started = Instant::now();

    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(
                target: "sr.ws",
                connection_id = %connection_id,
                error = %e,
                "Rejected malformed frame"
            );
            reject_frame(outbound);
            return;
        }
    };

    let name = event.name();
    match event {
        ClientEvent::JoinSession {
            session_id,
            participant_id,
            participant_name,
        } => registry.join(connection_id, session_id, participant_id, participant_name),
        ClientEvent::Offer {
            session_id,
            target_id,
            payload,
        } => registry.relay(connection_id, SignalKind::Offer, session_id, target_id, payload),
        ClientEvent::Answer {
            session_id,
            target_id,
            payload,
        } => registry.relay(connection_id, SignalKind::Answer, session_id, target_id, payload),
        ClientEvent::IceCandidate {
            session_id,
            target_id,
            payload,
        } => registry.relay(
            connection_id,
            SignalKind::IceCandidate,
            session_id,
            target_id,
            payload,
        ),
        ClientEvent::EndSession { session_id } => registry.end_session(connection_id, session_id),
    }

    record_event_latency(name, started.elapsed());
}

fn reject_frame(outbound: &mpsc::UnboundedSender<ServerEvent>) {
    record_message_dropped("rejected_input");
    let _ = outbound.send(ServerEvent::Error {
        code: "rejected-input".to_string(),
        message: "Malformed or unrecognized event".to_string(),
    });
}
