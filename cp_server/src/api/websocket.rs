//! WebSocket handler for live tournament rooms.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{tournament_id}?token=<jwt>`; without a
//!    token the connection is an anonymous viewer
//! 2. The server joins the room before upgrading, so unknown tournaments
//!    and bad tokens are answered with plain HTTP errors
//! 3. After the upgrade two tasks run until either side ends:
//!    - Send task: forwards room events (first one is the full snapshot)
//!    - Receive task: decodes client commands and dispatches them
//! 4. On disconnect the connection leaves the room
//!
//! Every frame is one JSON object tagged with `type`:
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6970/ws/1?token=eyJhbGc...');
//! ws.onmessage = (frame) => replica.apply(JSON.parse(frame.data));
//! ws.send(JSON.stringify({ type: "submit_result", gameId: 12, result: "draw" }));
//! ```
//!
//! If the room closes the event queue (this client fell behind or stopped
//! sending heartbeats) the socket is closed; reconnecting yields a fresh
//! snapshot.

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use club_pairing::{
    codec,
    messages::{ClientCommand, ServerEvent},
    room::{AuthContext, DispatchError, RoomSession},
    tournament::TournamentId,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, info, warn};
use serde::Deserialize;
use std::time::Instant;
use tokio::sync::mpsc;

use super::{AppState, registry_failure, throttle::FrameThrottle};
use crate::{logging, metrics};

/// Capacity of the queue for errors raised by the socket itself
const LOCAL_QUEUE: usize = 8;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Verify the optional token, join the room, then upgrade.
///
/// # Errors
///
/// - `401 Unauthorized`: Token present but invalid or expired
/// - `404 Not Found`: Unknown tournament
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(tournament_id): Path<TournamentId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let auth = match query.token {
        Some(token) => match state.tokens.verify(&token) {
            Ok(claims) => AuthContext::user(claims.sub),
            Err(e) => {
                logging::log_security_event(
                    "invalid_token",
                    None,
                    Some(tournament_id),
                    &format!("WebSocket token rejected: {}", e),
                );
                return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
            }
        },
        None => AuthContext::anonymous(),
    };

    let (session, events) = match state.registry.join(tournament_id, auth).await {
        Ok(joined) => joined,
        Err(e) => return registry_failure(e).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session, events, state))
}

/// Run an upgraded connection until the client or the room ends it.
async fn handle_socket(
    socket: WebSocket,
    session: RoomSession,
    events: mpsc::Receiver<ServerEvent>,
    state: AppState,
) {
    info!(
        "WebSocket connected: tournament={}, connection={}, role={}, user={:?}",
        session.tournament_id, session.connection_id, session.role, session.auth.user_id
    );
    metrics::websocket_connected();

    let (sink, stream) = socket.split();
    let (local_tx, local_rx) = mpsc::channel(LOCAL_QUEUE);

    let mut send_task = tokio::spawn(forward_events(sink, events, local_rx));
    let mut recv_task = tokio::spawn(receive_commands(stream, session, local_tx, state.clone()));

    tokio::select! {
        dropped = &mut send_task => {
            recv_task.abort();
            if matches!(dropped, Ok(true)) {
                metrics::connection_dropped();
                warn!(
                    "Room {} dropped connection {}",
                    session.tournament_id, session.connection_id
                );
            }
        }
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.leave(&session).await;
    metrics::websocket_disconnected();

    info!(
        "WebSocket disconnected: tournament={}, connection={}",
        session.tournament_id, session.connection_id
    );
}

/// Write room events and locally raised errors to the socket.
///
/// Returns `true` when the room closed the event queue.
async fn forward_events(
    mut sink: SplitSink<WebSocket, Message>,
    mut events: mpsc::Receiver<ServerEvent>,
    mut local: mpsc::Receiver<ServerEvent>,
) -> bool {
    loop {
        let event = tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return true;
                }
            },
            Some(event) = local.recv() => event,
        };

        let frame = match codec::encode_event(&event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping {} event: {}", event.kind(), e);
                continue;
            }
        };

        if sink.send(Message::Text(frame.into())).await.is_err() {
            return false;
        }
        metrics::websocket_messages_sent();
    }
}

/// Read client frames and dispatch the commands they carry.
async fn receive_commands(
    mut stream: SplitStream<WebSocket>,
    session: RoomSession,
    local: mpsc::Sender<ServerEvent>,
    state: AppState,
) {
    let mut throttle = FrameThrottle::default();

    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(_)) => {
                let _ = local.try_send(ServerEvent::error(
                    "INVALID_MESSAGE",
                    "Binary frames are not supported",
                ));
                continue;
            }
            Ok(Message::Ping(_)) => {
                if state.registry.heartbeat(&session).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => continue,
            Err(e) => {
                debug!("WebSocket error on {}: {}", session.connection_id, e);
                break;
            }
        };
        metrics::websocket_messages_received();

        if let Err(limit) = throttle.check() {
            metrics::throttle_hits_total(limit.as_str());
            warn!(
                "{} throttle hit by connection {} (tournament {})",
                limit, session.connection_id, session.tournament_id
            );
            let _ = local.try_send(ServerEvent::error("RATE_LIMITED", limit.client_message()));
            continue;
        }

        let command = match codec::decode_command(text.as_str()) {
            Ok(command) => command,
            Err(e) => {
                debug!("Undecodable frame from {}: {}", session.connection_id, e);
                let _ = local.try_send(ServerEvent::error(e.code(), e.to_string()));
                continue;
            }
        };

        if !dispatch(&state, &session, command).await {
            break;
        }
    }
}

/// Dispatch one command. Returns `false` once the room is gone.
async fn dispatch(state: &AppState, session: &RoomSession, command: ClientCommand) -> bool {
    let kind = command.kind();
    let started = Instant::now();

    let result = state.registry.dispatch(session, command).await;

    let elapsed = started.elapsed();
    logging::log_performance("dispatch", elapsed.as_millis() as u64, Some(kind));
    metrics::command_duration_ms(kind, elapsed.as_secs_f64() * 1000.0);

    match result {
        Ok(()) => {
            metrics::command_processed(kind, "ok");
            true
        }
        Err(e) => {
            metrics::command_processed(kind, e.code());
            match e {
                DispatchError::Authorization(_) => {
                    logging::log_security_event(
                        "unauthorized_command",
                        session.auth.user_id,
                        Some(session.tournament_id),
                        &e.to_string(),
                    );
                    true
                }
                DispatchError::RoomClosed(_) => false,
                _ => true,
            }
        }
    }
}
