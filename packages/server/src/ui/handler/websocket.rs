//! WebSocket connection handler.
//!
//! One task pair per connection: `pusher_loop` drains the connection's
//! outbound channel into the socket, the receive loop parses inbound
//! frames into `ClientAction` and dispatches them to the usecases.
//! Malformed frames and per-action failures are reported back to the
//! acting connection only and never close the socket or reach other
//! participants.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, ConnectionId, ConversationId, DisplayName, MessageContent, UserId},
    infrastructure::dto::websocket::{
        ClientAction, ConnectedEvent, ErrorEvent, EventType, PresenceInfoDto,
    },
    ui::state::AppState,
};

/// Query parameters for the WebSocket handshake.
///
/// The identity is taken from the query; session issuance happens in
/// front of this service and a connection only reaches the engine
/// already authenticated.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = match UserId::try_from(query.user_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid user_id '{}': {}", query.user_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let display_name = match DisplayName::new(query.display_name) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Invalid display_name: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Create the outbound channel for this connection
    let (tx, rx) = mpsc::unbounded_channel();

    let connection = state
        .connect_session_usecase
        .execute(user_id, display_name, tx)
        .await;
    tracing::info!(
        "Connection '{}' established for user '{}'",
        connection.id.as_str(),
        connection.user_id.as_str()
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection, rx)))
}

/// Spawns a task that drains the outbound channel into the WebSocket
/// sink. Exits when the channel closes or the sink fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection: Connection,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = connection.id.clone();

    // Send the connection ack with the current presence roster
    {
        let roster = state.presence.roster().await;
        let ack = ConnectedEvent {
            r#type: EventType::Connected,
            connection_id: connection_id.as_str().to_string(),
            user_id: connection.user_id.as_str().to_string(),
            presence: roster.iter().map(PresenceInfoDto::from).collect(),
        };
        let ack_json = match serde_json::to_string(&ack) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize connected ack: {}", e);
                return;
            }
        };
        if let Err(e) = sender.send(Message::Text(ack_json.into())).await {
            tracing::error!(
                "Failed to send connected ack to '{}': {}",
                connection_id.as_str(),
                e
            );
            state
                .disconnect_session_usecase
                .execute(&connection_id)
                .await;
            return;
        }
    }

    let state_clone = state.clone();
    let conn_for_recv = connection_id.clone();

    // Receive loop: parse and dispatch inbound actions
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    let action = match serde_json::from_str::<ClientAction>(&text) {
                        Ok(action) => action,
                        Err(e) => {
                            tracing::warn!("Dropping malformed frame: {}", e);
                            report_error(
                                &state_clone,
                                &conn_for_recv,
                                ErrorEvent::new("validation_failed", e.to_string()),
                            )
                            .await;
                            continue;
                        }
                    };
                    if let Err(error_event) =
                        dispatch_action(&state_clone, &conn_for_recv, action).await
                    {
                        report_error(&state_clone, &conn_for_recv, error_event).await;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", conn_for_recv.as_str());
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Cleanup is synchronous and idempotent: rooms, presence and the
    // pusher channel are all released before this handler returns.
    state
        .disconnect_session_usecase
        .execute(&connection_id)
        .await;
}

/// Dispatch one parsed action to its usecase, mapping failures onto the
/// error frame reported back to the caller.
async fn dispatch_action(
    state: &AppState,
    connection_id: &ConnectionId,
    action: ClientAction,
) -> Result<(), ErrorEvent> {
    match action {
        ClientAction::JoinConversation { conversation_id } => {
            let conversation_id = parse_conversation_id(conversation_id)?;
            state
                .join_conversation_usecase
                .execute(connection_id, conversation_id)
                .await
                .map_err(|e| ErrorEvent::new(e.code(), e.to_string()))
        }
        ClientAction::LeaveConversation { conversation_id } => {
            let conversation_id = parse_conversation_id(conversation_id)?;
            state
                .leave_conversation_usecase
                .execute(connection_id, conversation_id)
                .await
                .map_err(|e| ErrorEvent::new(e.code(), e.to_string()))
        }
        ClientAction::SendMessage {
            conversation_id,
            content,
            kind,
            attachment,
        } => {
            let conversation_id = parse_conversation_id(conversation_id)?;
            let content = MessageContent::try_from(content)
                .map_err(|e| ErrorEvent::new("validation_failed", e.to_string()))?;
            state
                .publish_message_usecase
                .execute(connection_id, conversation_id, content, kind, attachment)
                .await
                .map(|_| ())
                .map_err(|e| ErrorEvent::new(e.code(), e.to_string()))
        }
        ClientAction::TypingStart { conversation_id } => {
            let conversation_id = parse_conversation_id(conversation_id)?;
            state
                .typing_usecase
                .execute(connection_id, conversation_id, true)
                .await
                .map_err(|e| ErrorEvent::new(e.code(), e.to_string()))
        }
        ClientAction::TypingStop { conversation_id } => {
            let conversation_id = parse_conversation_id(conversation_id)?;
            state
                .typing_usecase
                .execute(connection_id, conversation_id, false)
                .await
                .map_err(|e| ErrorEvent::new(e.code(), e.to_string()))
        }
        ClientAction::MarkAsRead {
            conversation_id,
            message_ids,
        } => {
            let conversation_id = parse_conversation_id(conversation_id)?;
            state
                .mark_read_usecase
                .execute(connection_id, conversation_id, message_ids)
                .await
                .map(|_| ())
                .map_err(|e| ErrorEvent::new(e.code(), e.to_string()))
        }
        ClientAction::UpdatePresence { status } => state
            .update_presence_usecase
            .execute(connection_id, &status)
            .await
            .map(|_| ())
            .map_err(|e| ErrorEvent::new(e.code(), e.to_string())),
    }
}

fn parse_conversation_id(raw: String) -> Result<ConversationId, ErrorEvent> {
    ConversationId::try_from(raw).map_err(|e| ErrorEvent::new("validation_failed", e.to_string()))
}

async fn report_error(state: &AppState, connection_id: &ConnectionId, error_event: ErrorEvent) {
    match serde_json::to_string(&error_event) {
        Ok(json) => {
            if let Err(e) = state.pusher.push_to(connection_id, &json).await {
                tracing::warn!(
                    "Failed to report error to connection '{}': {}",
                    connection_id.as_str(),
                    e
                );
            }
        }
        Err(e) => tracing::warn!("Failed to serialize error event: {}", e),
    }
}
