//! Gateway: one long-lived push stream per client connection
//!
//! Each connection registers a session with the event bus (implicitly
//! subscribed to `global`), receives a welcome frame and the global snapshot,
//! then pumps bus events to the socket while handling subscribe/unsubscribe
//! and heartbeats. The session and all its subscriptions are dropped when the
//! socket closes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tracing::debug;

use super::bus::{Channel, EventBus};
use super::events::{ClientMessage, ConnectedData, ServerEvent};
use super::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let session_id = EventBus::generate_session_id();
    let mut rx = state.bus().register(&session_id);
    debug!(session = %session_id, "gateway connected");

    // Welcome frame, then the global snapshot so the roster is never blind
    let welcome = ServerEvent::Connected(ConnectedData {
        session_id: session_id.clone(),
    });
    if !send_event(&mut socket, &welcome).await {
        state.bus().unregister(&session_id);
        return;
    }
    let snapshot = state.supervisor.channel_snapshot(&Channel::Global);
    if !send_event(&mut socket, &snapshot).await {
        state.bus().unregister(&session_id);
        return;
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            // Bus events to the client, per-session FIFO
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        if !send_event(&mut socket, &event).await {
                            break;
                        }
                    }
                    None => break, // session pruned by the bus
                }
            }

            _ = heartbeat.tick() => {
                if !send_event(&mut socket, &ServerEvent::Ping).await {
                    break;
                }
            }

            // Client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, &session_id, &state).await {
                            break;
                        }
                    }
                    Some(Err(_)) => break,
                    None => break,
                }
            }
        }
    }

    state.bus().unregister(&session_id);
    debug!(session = %session_id, "gateway disconnected");
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(_) => true, // unserializable events are dropped, never fatal
    }
}

/// Returns false if the connection should be closed. Unparsable messages
/// and unknown types are ignored.
async fn handle_client_message(msg: Message, session_id: &str, state: &Arc<AppState>) -> bool {
    match msg {
        Message::Text(text) => {
            if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                match client_msg {
                    ClientMessage::Subscribe { channel } => {
                        if let Ok(channel) = Channel::parse(&channel) {
                            if state.bus().subscribe(session_id, channel.clone()) {
                                // Snapshot-on-subscribe: late subscribers see
                                // current state before the next delta.
                                let snapshot = state.supervisor.channel_snapshot(&channel);
                                let _ = state.bus().send_to(session_id, snapshot);
                            }
                        }
                    }
                    ClientMessage::Unsubscribe { channel } => {
                        if let Ok(channel) = Channel::parse(&channel) {
                            state.bus().unsubscribe(session_id, &channel);
                        }
                    }
                    ClientMessage::Ping => {
                        let _ = state.bus().send_to(session_id, ServerEvent::Pong);
                    }
                }
            }
            true
        }
        Message::Binary(_) => true,
        Message::Ping(_) => true, // axum answers transport pings itself
        Message::Pong(_) => true,
        Message::Close(_) => false,
    }
}
