//! WebSocket client session management.
//!
//! One session = one live connection. Incoming frames are rendered and,
//! for message/notification-class events, normalized into the shared
//! queue. User input is read on a blocking rustyline thread and turned
//! into `ClientAction` frames.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use kakehashi_server::infrastructure::dto::websocket::{
    ClientAction, ConnectedEvent, ErrorEvent, MessagesReadEvent, NewMessageEvent,
    PresenceUpdatedEvent, UserOfflineEvent, UserOnlineEvent, UserTypingEvent,
};
use kakehashi_shared::time::SystemClock;

use crate::{
    domain::{Command, parse_command},
    error::ClientError,
    fetch::{NotificationFetcher, http_base_from_ws_url},
    formatter::EventFormatter,
    notify::{NotificationQueue, normalize, normalize_batch},
    ui::redisplay_prompt,
};

/// Run one WebSocket client session until the connection ends
pub async fn run_client_session(
    url: &str,
    user_id: &str,
    display_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let connect_url = format!("{url}?user_id={user_id}&display_name={display_name}");

    let (ws_stream, response) = match connect_async(&connect_url).await {
        Ok(result) => result,
        Err(e) => {
            let error_msg = e.to_string();
            // HTTP 400 on the handshake means the identity was rejected
            if error_msg.contains("400") || error_msg.contains("Bad Request") {
                return Err(Box::new(ClientError::InvalidIdentity(user_id.to_string())));
            }
            return Err(Box::new(ClientError::ConnectionError(error_msg)));
        }
    };
    if response.status().as_u16() == 400 {
        return Err(Box::new(ClientError::InvalidIdentity(user_id.to_string())));
    }

    tracing::info!("Connected to conversation server!");
    println!(
        "\nYou are '{}'. /join a conversation, then type messages. Press Ctrl+C to exit.\n",
        user_id
    );

    let queue = Arc::new(Mutex::new(NotificationQueue::new(Arc::new(SystemClock))));
    let fetcher = Arc::new(NotificationFetcher::new(http_base_from_ws_url(url)));

    // Reconciliation: replay persisted records through the same
    // normalization path as live events. Idempotent enqueue makes the
    // overlap with the live socket harmless.
    match fetcher.fetch_raw_events(user_id).await {
        Ok(raws) => {
            let events = normalize_batch(&raws, user_id, &SystemClock);
            let mut queue_guard = queue.lock().await;
            for event in events {
                queue_guard.enqueue(event);
            }
            let pending = queue_guard.len();
            if pending > 0 {
                println!("{pending} pending notification(s); use /notifications to list them\n");
            }
        }
        Err(e) => {
            tracing::warn!("Notification reconciliation fetch failed: {}", e);
        }
    }

    let (mut write, mut read) = ws_stream.split();

    // Conversation currently on screen; messages in it render directly
    // and skip the notification queue.
    let active_conversation: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    // Task: render incoming frames and feed the notification queue
    let user_id_for_read = user_id.to_string();
    let queue_for_read = queue.clone();
    let active_for_read = active_conversation.clone();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    handle_frame(&text, &user_id_for_read, &queue_for_read, &active_for_read).await;
                    redisplay_prompt(&user_id_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Blocking thread for rustyline (synchronous readline)
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_user_id = user_id.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_user_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Task: turn input lines into actions
    let user_id_for_write = user_id.to_string();
    let queue_for_write = queue.clone();
    let fetcher_for_write = fetcher.clone();
    let active_for_write = active_conversation.clone();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let action = match parse_command(&line) {
                Command::Join(conversation_id) => {
                    *active_for_write.lock().await = Some(conversation_id.clone());
                    Some(ClientAction::JoinConversation { conversation_id })
                }
                Command::Leave(conversation_id) => {
                    let mut active = active_for_write.lock().await;
                    if active.as_deref() == Some(conversation_id.as_str()) {
                        *active = None;
                    }
                    drop(active);
                    Some(ClientAction::LeaveConversation { conversation_id })
                }
                Command::Read(conversation_id) => Some(ClientAction::MarkAsRead {
                    conversation_id,
                    message_ids: None,
                }),
                Command::Status(status) => Some(ClientAction::UpdatePresence { status }),
                Command::TypingStart(conversation_id) => {
                    Some(ClientAction::TypingStart { conversation_id })
                }
                Command::TypingStop(conversation_id) => {
                    Some(ClientAction::TypingStop { conversation_id })
                }
                Command::Say(content) => match active_for_write.lock().await.clone() {
                    Some(conversation_id) => Some(ClientAction::SendMessage {
                        conversation_id,
                        content,
                        kind: Default::default(),
                        attachment: None,
                    }),
                    None => {
                        println!("\nNo active conversation; /join one first");
                        redisplay_prompt(&user_id_for_write);
                        None
                    }
                },
                Command::ShowNotifications => {
                    let snapshot = queue_for_write.lock().await.snapshot();
                    print!("{}", EventFormatter::format_notifications(&snapshot));
                    redisplay_prompt(&user_id_for_write);
                    None
                }
                Command::Dismiss(entry_id) => {
                    let removed = queue_for_write.lock().await.dismiss(&entry_id);
                    if removed {
                        // 永続側にも既読を反映する（失敗しても継続）
                        if let Err(e) = fetcher_for_write.mark_read(&entry_id).await {
                            tracing::warn!("Failed to mark notification read: {}", e);
                        }
                        println!("\nDismissed '{entry_id}'");
                    } else {
                        println!("\nNo notification with id '{entry_id}'");
                    }
                    redisplay_prompt(&user_id_for_write);
                    None
                }
                Command::Unknown(line) => {
                    println!(
                        "\nUnknown command '{line}'. Commands: /join /leave /read /status /typing /done /notifications /dismiss"
                    );
                    redisplay_prompt(&user_id_for_write);
                    None
                }
            };

            let Some(action) = action else { continue };
            let json = match serde_json::to_string(&action) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize action: {}", e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send action: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}

/// Render one incoming frame and feed the notification queue for
/// message-class events
async fn handle_frame(
    text: &str,
    viewer_id: &str,
    queue: &Arc<Mutex<NotificationQueue>>,
    active_conversation: &Arc<Mutex<Option<String>>>,
) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        print!("{}", EventFormatter::format_raw_message(text));
        return;
    };
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);

    match event_type.as_deref() {
        Some("connected") => {
            if let Ok(event) = serde_json::from_value::<ConnectedEvent>(value) {
                print!(
                    "{}",
                    EventFormatter::format_connected(&event.presence, viewer_id)
                );
            }
        }
        Some("new_message") => {
            if let Ok(event) = serde_json::from_value::<NewMessageEvent>(value.clone()) {
                print!(
                    "{}",
                    EventFormatter::format_new_message(&event.conversation_id, &event.message)
                );
            }
            // Self-echo is suppressed inside normalize; messages in the
            // conversation currently on screen render above and skip the
            // queue too.
            match normalize(&value, viewer_id, &SystemClock) {
                Ok(Some(event)) => {
                    let viewing = active_conversation.lock().await;
                    if event.conversation_id() != viewing.as_deref() {
                        drop(viewing);
                        queue.lock().await.enqueue(event);
                    }
                }
                Ok(None) => {}
                Err(reason) => {
                    tracing::warn!("Dropping live event: {}", reason);
                }
            }
        }
        Some("user_typing") => {
            if let Ok(event) = serde_json::from_value::<UserTypingEvent>(value) {
                print!(
                    "{}",
                    EventFormatter::format_user_typing(
                        &event.conversation_id,
                        &event.user_id,
                        event.is_typing
                    )
                );
            }
        }
        Some("messages_read") => {
            if let Ok(event) = serde_json::from_value::<MessagesReadEvent>(value) {
                print!(
                    "{}",
                    EventFormatter::format_messages_read(&event.conversation_id, &event.user_id)
                );
            }
        }
        Some("user_online") => {
            if let Ok(event) = serde_json::from_value::<UserOnlineEvent>(value) {
                print!(
                    "{}",
                    EventFormatter::format_user_online(&event.user_id, event.timestamp)
                );
            }
        }
        Some("user_offline") => {
            if let Ok(event) = serde_json::from_value::<UserOfflineEvent>(value) {
                print!(
                    "{}",
                    EventFormatter::format_user_offline(&event.user_id, event.timestamp)
                );
            }
        }
        Some("presence_updated") => {
            if let Ok(event) = serde_json::from_value::<PresenceUpdatedEvent>(value) {
                print!(
                    "{}",
                    EventFormatter::format_presence_updated(&event.user_id, event.status.as_str())
                );
            }
        }
        Some("joined_conversation") | Some("left_conversation") => {
            print!("{}", EventFormatter::format_raw_message(text));
        }
        Some("error") => {
            if let Ok(event) = serde_json::from_value::<ErrorEvent>(value) {
                print!("{}", EventFormatter::format_error(&event.code, &event.detail));
            }
        }
        _ => {
            print!("{}", EventFormatter::format_raw_message(text));
        }
    }
}
