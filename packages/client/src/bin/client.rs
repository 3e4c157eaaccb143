//! CLI client for the kakehashi conversation engine.
//!
//! Connects to the server, joins conversations, sends messages and
//! renders live presence/typing/notification events. Automatically
//! reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakehashi-client -- --user-id alice
//! cargo run --bin kakehashi-client -- -u bob --display-name "Bob B."
//! ```

use clap::Parser;

use kakehashi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "CLI client for the kakehashi conversation engine", long_about = None)]
struct Args {
    /// Authenticated identity to bind the connection to
    #[arg(short = 'u', long)]
    user_id: String,

    /// Display name shown to other participants (defaults to user id)
    #[arg(short = 'd', long, default_value = "")]
    display_name: String,

    /// WebSocket server URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = kakehashi_client::run_client(args.url, args.user_id, args.display_name).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
