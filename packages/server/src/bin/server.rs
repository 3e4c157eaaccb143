//! Conversation fan-out and presence coordination server.
//!
//! Maintains live WebSocket connections, conversation rooms, presence
//! and typing indicators, and fans out messages and read receipts.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakehashi-server
//! cargo run --bin kakehashi-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use kakehashi_server::{
    infrastructure::{
        ConnectionRegistry, InMemoryMessageStore, InMemoryNotificationStore, InMemoryUserDirectory,
        PresenceTracker, RoomManager, WebSocketEventPusher,
    },
    ui::{Server, state::AppState},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, JoinConversationUseCase,
        LeaveConversationUseCase, MarkReadUseCase, PublishMessageUseCase, TypingIndicatorUseCase,
        UpdatePresenceUseCase,
    },
};
use kakehashi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Conversation fan-out and presence coordination server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Engine state components
    // 2. Collaborator implementations
    // 3. UseCases
    // 4. AppState
    // 5. Server

    // 1. Engine state components
    let clock = Arc::new(SystemClock);
    let pusher = Arc::new(WebSocketEventPusher::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let rooms = Arc::new(RoomManager::new(pusher.clone()));
    let presence = Arc::new(PresenceTracker::new(rooms.clone(), clock.clone()));

    // 2. Collaborator implementations (in-memory)
    let message_store = Arc::new(InMemoryMessageStore::new(clock.clone()));
    let directory = Arc::new(InMemoryUserDirectory::new());
    let notification_store = Arc::new(InMemoryNotificationStore::new());

    // 3. UseCases
    let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
        registry.clone(),
        rooms.clone(),
        presence.clone(),
        directory.clone(),
        pusher.clone(),
        clock.clone(),
    ));
    let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
        registry.clone(),
        rooms.clone(),
        presence.clone(),
        pusher.clone(),
    ));
    let join_conversation_usecase = Arc::new(JoinConversationUseCase::new(
        registry.clone(),
        rooms.clone(),
        pusher.clone(),
    ));
    let leave_conversation_usecase = Arc::new(LeaveConversationUseCase::new(
        registry.clone(),
        rooms.clone(),
        pusher.clone(),
    ));
    let publish_message_usecase = Arc::new(PublishMessageUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_store.clone(),
        directory.clone(),
        notification_store.clone(),
    ));
    let mark_read_usecase = Arc::new(MarkReadUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_store.clone(),
    ));
    let typing_usecase = Arc::new(TypingIndicatorUseCase::new(registry.clone(), rooms.clone()));
    let update_presence_usecase = Arc::new(UpdatePresenceUseCase::new(
        registry.clone(),
        presence.clone(),
    ));

    // 4. AppState
    let state = AppState {
        connect_session_usecase,
        disconnect_session_usecase,
        join_conversation_usecase,
        leave_conversation_usecase,
        publish_message_usecase,
        mark_read_usecase,
        typing_usecase,
        update_presence_usecase,
        presence,
        message_store,
        notification_store,
        pusher,
    };

    // 5. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
