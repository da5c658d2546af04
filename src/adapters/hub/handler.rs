//! WebSocket upgrade handler for document collaboration.
//!
//! Connection lifecycle:
//! 1. Validate the credential and identity from the query string
//! 2. Upgrade to WebSocket
//! 3. Join the document's room and send `initial_state`
//! 4. Relay messages both ways until either side stops
//! 5. Leave the room (announces `user_left`)

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;

use super::rooms::{ConnectionId, RoomManager};
use crate::domain::foundation::{DocumentId, UserId};
use crate::domain::realtime::RealtimeMessage;

/// Shared state of the hub routes.
#[derive(Clone)]
pub struct HubState {
    pub rooms: Arc<RoomManager>,
}

impl HubState {
    pub fn new(rooms: Arc<RoomManager>) -> Self {
        Self { rooms }
    }
}

/// Query string of the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

/// `GET /ws/documents/:document_id?token=..&user_id=..&user_name=..`
///
/// The token is only checked for presence; issuing and verifying
/// credentials belongs to the authentication service.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(document_id): Path<String>,
    Query(params): Query<ConnectParams>,
    State(state): State<HubState>,
) -> Response {
    if params.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return (StatusCode::UNAUTHORIZED, "Missing session token").into_response();
    }

    let document_id: DocumentId = match document_id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid document ID").into_response(),
    };
    let user_id: UserId = match params.user_id.as_deref().unwrap_or_default().parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Missing user_id").into_response(),
    };
    let user_name = params.user_name.filter(|name| !name.trim().is_empty());

    ws.on_upgrade(move |socket| handle_socket(socket, document_id, user_id, user_name, state))
}

async fn handle_socket(
    socket: WebSocket,
    document_id: DocumentId,
    user_id: UserId,
    user_name: Option<String>,
    state: HubState,
) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = ConnectionId::new();

    let joined = state
        .rooms
        .join(&document_id, connection_id, user_id.clone(), user_name)
        .await;
    tracing::info!(
        document_id = %document_id,
        user_id = %user_id,
        connection_id = %connection_id,
        others = joined.roster.len(),
        "Collaborator connected"
    );

    let initial = RealtimeMessage::InitialState {
        user_id: Some(user_id.clone()),
        active_users: joined.roster,
    };
    if let Err(e) = send_message(&mut sender, &initial).await {
        tracing::debug!(connection_id = %connection_id, error = %e, "Failed to send initial state");
        state.rooms.leave(&connection_id).await;
        return;
    }

    let mut frames = joined.frames;
    let mut send_task = tokio::spawn(async move {
        loop {
            match frames.recv().await {
                Ok(frame) if frame.from == connection_id => {}
                Ok(frame) => {
                    if let Err(e) = send_message(&mut sender, &frame.message).await {
                        tracing::debug!(connection_id = %connection_id, error = %e, "Send error, closing connection");
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(connection_id = %connection_id, skipped, "Connection lagging, frames dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let rooms = Arc::clone(&state.rooms);
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match RealtimeMessage::from_json(&text) {
                    Ok(message) => {
                        let message_type = message.type_name();
                        if !rooms.relay(&connection_id, message).await {
                            tracing::debug!(
                                connection_id = %connection_id,
                                message_type,
                                "Ignoring message clients may not send"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!(connection_id = %connection_id, error = %e, "Dropping malformed frame");
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::warn!(connection_id = %connection_id, "Received unsupported binary message");
                }
                // Answered by axum.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.rooms.leave(&connection_id).await;
    tracing::info!(
        document_id = %document_id,
        user_id = %user_id,
        connection_id = %connection_id,
        "Collaborator disconnected"
    );
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &RealtimeMessage,
) -> Result<(), axum::Error> {
    let json = message.to_json().map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

async fn health() -> &'static str {
    "ok"
}

/// Router for the collaboration hub.
pub fn hub_router(state: HubState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws/documents/:document_id", get(ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_state_shares_room_manager() {
        let rooms = Arc::new(RoomManager::default());
        let state = HubState::new(rooms.clone());
        assert!(Arc::ptr_eq(&state.rooms, &rooms));
    }

    #[test]
    fn connect_params_tolerate_missing_fields() {
        let params: ConnectParams = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(params.token.as_deref(), Some("abc"));
        assert!(params.user_id.is_none());
    }
}
